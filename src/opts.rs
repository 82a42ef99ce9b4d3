//! Connection options.

use url::Url;

use crate::error::Error;

/// Connection options for a session.
///
/// The crate never opens a socket itself; `host` and `port` are carried
/// for the caller that dials the transport. The remaining fields feed the
/// startup configuration block.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Hostname or IP address, for the caller's dial.
    ///
    /// Default: `""`
    pub host: String,

    /// Port number, for the caller's dial.
    ///
    /// Default: `5432`
    pub port: u16,

    /// Username sent in the startup configuration block.
    ///
    /// Default: `""`
    pub user: String,

    /// Database name to use.
    ///
    /// Default: `None`
    pub database: Option<String>,

    /// Application name to report to the server.
    ///
    /// Default: `None`
    pub application_name: Option<String>,

    /// Additional startup parameters.
    ///
    /// Default: `[]`
    pub params: Vec<(String, String)>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 5432,
            user: String::new(),
            database: None,
            application_name: None,
            params: Vec::new(),
        }
    }
}

impl Opts {
    /// Key/value pairs for the startup configuration block, in the order
    /// they are written on the wire.
    pub fn startup_params(&self) -> Vec<(&str, &str)> {
        let mut params: Vec<(&str, &str)> = vec![("user", &self.user)];

        if let Some(db) = &self.database {
            params.push(("database", db));
        }

        if let Some(app) = &self.application_name {
            params.push(("application_name", app));
        }

        for (name, value) in &self.params {
            params.push((name, value));
        }

        params
    }
}

impl TryFrom<&Url> for Opts {
    type Error = Error;

    /// Parse a PostgreSQL connection URL.
    ///
    /// Format: `postgres://[user@]host[:port][/database][?param1=value1&param2=value2&..]`
    ///
    /// Supported query parameters:
    /// - `application_name`: application name
    ///
    /// Unrecognized query parameters are forwarded as startup parameters.
    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        if !["postgres", "pg"].contains(&url.scheme()) {
            return Err(Error::InvalidUsage(format!(
                "Invalid scheme: expected 'postgres://' or 'pg://', got '{}://'",
                url.scheme()
            )));
        }

        let mut opts = Opts {
            host: url.host_str().unwrap_or("localhost").to_string(),
            port: url.port().unwrap_or(5432),
            user: url.username().to_string(),
            database: url.path().strip_prefix('/').and_then(|s| {
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }),
            ..Opts::default()
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "application_name" => {
                    opts.application_name = Some(value.to_string());
                }
                _ => {
                    opts.params.push((key.to_string(), value.to_string()));
                }
            }
        }

        Ok(opts)
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(s).map_err(|e| Error::InvalidUsage(format!("Invalid URL: {}", e)))?;
        Self::try_from(&url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parsing() {
        let opts = Opts::try_from("postgres://alice@db.example:5433/app?application_name=psql")
            .unwrap();
        assert_eq!(opts.host, "db.example");
        assert_eq!(opts.port, 5433);
        assert_eq!(opts.user, "alice");
        assert_eq!(opts.database.as_deref(), Some("app"));
        assert_eq!(opts.application_name.as_deref(), Some("psql"));
    }

    #[test]
    fn startup_params_order() {
        let opts = Opts {
            user: "alice".into(),
            database: Some("app".into()),
            application_name: Some("psql".into()),
            params: vec![("client_encoding".into(), "UTF8".into())],
            ..Opts::default()
        };
        assert_eq!(
            opts.startup_params(),
            vec![
                ("user", "alice"),
                ("database", "app"),
                ("application_name", "psql"),
                ("client_encoding", "UTF8"),
            ]
        );
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(Opts::try_from("mysql://alice@localhost/app").is_err());
    }
}
