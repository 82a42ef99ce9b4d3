//! Frontend (client -> server) message encoding.

use crate::protocol::codec::MessageBuilder;
use crate::protocol::tag;

/// Fixed protocol-version preamble, copied verbatim from an observed
/// exchange. Sent before the configuration block; its subfields are not
/// interpreted here.
pub const STARTUP_PREAMBLE: [u8; 8] = [0x00, 0x00, 0x00, 0x08, 0x04, 0xd2, 0x16, 0x2f];

/// Write the startup sequence: the fixed preamble, then the configuration
/// block.
///
/// Block layout: 4-byte total length (including itself), 2-byte count of
/// key/value pairs, 2 reserved zero bytes, a null-terminated key and value
/// per pair, one final null terminator.
pub fn write_startup(buf: &mut Vec<u8>, params: &[(&str, &str)]) {
    buf.extend_from_slice(&STARTUP_PREAMBLE);

    let mut block = MessageBuilder::new_untagged(buf);
    block.write_u16(params.len() as u16);
    block.write_u16(0); // reserved
    for (name, value) in params {
        block.write_cstr(name);
        block.write_cstr(value);
    }
    block.write_u8(0);
    block.finish();
}

/// Write a simple-query request: tag `Q`, length `utf8_len(sql) + 5`, the
/// raw SQL bytes, one null terminator.
pub fn write_query(buf: &mut Vec<u8>, sql: &str) {
    let mut msg = MessageBuilder::new(buf, tag::QUERY);
    msg.write_cstr(sql);
    msg.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::FrameDecoder;

    #[test]
    fn query_select_one() {
        let mut buf = Vec::new();
        write_query(&mut buf, "select 1");

        assert_eq!(buf[0], b'Q');
        let len = i32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        assert_eq!(len, 13);
        assert_eq!(&buf[5..], b"select 1\0");
    }

    #[test]
    fn empty_query_has_length_five() {
        let mut buf = Vec::new();
        write_query(&mut buf, "");

        assert_eq!(buf[0], b'Q');
        let len = i32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        assert_eq!(len, 5);
        assert_eq!(buf.last(), Some(&0));
    }

    #[test]
    fn query_round_trips_through_frame_decoder() {
        for sql in ["", "select 1", "select '\u{00e9}\u{6f22}\u{5b57}'"] {
            let mut buf = Vec::new();
            write_query(&mut buf, sql);

            let mut dec = FrameDecoder::new();
            dec.extend(&buf);
            let frame = dec.next_frame().unwrap().unwrap();

            assert_eq!(frame.tag, b'Q');
            assert_eq!(frame.declared_len as usize, sql.len() + 5);
            let (body, terminator) = frame.payload.split_at(frame.payload.len() - 1);
            assert_eq!(body, sql.as_bytes());
            assert_eq!(terminator, &[0]);
        }
    }

    #[test]
    fn startup_matches_observed_exchange() {
        let mut buf = Vec::new();
        write_startup(
            &mut buf,
            &[
                ("user", "alexcusack"),
                ("database", "postgres"),
                ("application_name", "psql"),
            ],
        );

        assert_eq!(&buf[..8], &STARTUP_PREAMBLE);

        // config block: length 0x41 including itself, 3 pairs, 2 reserved bytes
        let block = &buf[8..];
        assert_eq!(block.len(), 0x41);
        assert_eq!(&block[..4], &0x41_i32.to_be_bytes());
        assert_eq!(&block[4..6], &3_u16.to_be_bytes());
        assert_eq!(&block[6..8], &[0, 0]);
        assert_eq!(
            &block[8..],
            b"user\0alexcusack\0database\0postgres\0application_name\0psql\0\0"
        );
    }
}
