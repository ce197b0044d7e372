use rawhttp::buffer::ByteBuffer;
use rawhttp::error::BufferUnderflow;

#[test]
fn test_bytes_come_out_in_order_whatever_the_split() {
    let input: Vec<u8> = (0..200u8).collect();
    let mut buf = ByteBuffer::with_capacity(4);
    let mut out = Vec::new();

    // Push and pop with mismatched piece sizes.
    for (i, piece) in input.chunks(7).enumerate() {
        buf.push(piece);
        let take = (i % 3 + 1) * 3;
        if buf.size() >= take {
            out.extend_from_slice(&buf.pop(take).unwrap());
        }
    }
    let rest = buf.size();
    out.extend_from_slice(&buf.pop(rest).unwrap());

    assert_eq!(out, input);
    assert!(buf.is_empty());
}

#[test]
fn test_window_stays_within_capacity() {
    let mut buf = ByteBuffer::with_capacity(2);
    for round in 0..50usize {
        buf.push(&vec![b'x'; round % 11]);
        let n = buf.size() / 2;
        buf.pop(n).unwrap();

        let (start, end) = buf.window();
        assert!(start <= end);
        assert!(end <= buf.capacity());
        assert_eq!(end - start, buf.size());
    }
}

#[test]
fn test_empty_buffer_resets_window() {
    let mut buf = ByteBuffer::with_capacity(16);
    buf.push(b"abcdef");
    buf.pop(6).unwrap();

    assert_eq!(buf.window(), (0, 0));
}

#[test]
fn test_consumed_prefix_is_compacted() {
    let mut buf = ByteBuffer::with_capacity(8);
    buf.push(b"abcdefg");
    buf.pop(5).unwrap();

    // Past half the capacity, the remainder moves to the front.
    assert_eq!(buf.window(), (0, 2));
    assert_eq!(buf.data(), b"fg");
}

#[test]
fn test_pop_more_than_available() {
    let mut buf = ByteBuffer::new();
    buf.push(b"abc");

    assert_eq!(
        buf.pop(4),
        Err(BufferUnderflow {
            requested: 4,
            available: 3
        })
    );
    // Nothing was consumed.
    assert_eq!(buf.data(), b"abc");
}

#[test]
fn test_popped_bytes_do_not_alias_buffer() {
    let mut buf = ByteBuffer::with_capacity(4);
    buf.push(b"ab");
    let first = buf.pop(2).unwrap();
    buf.push(b"cd");

    assert_eq!(&first[..], b"ab");
    assert_eq!(buf.data(), b"cd");
}

#[test]
fn test_index_of() {
    let mut buf = ByteBuffer::new();
    buf.push(b"xxGET / HTTP/1.1\r\nHost: a\r\n\r\nbody");
    buf.pop(2).unwrap();

    assert_eq!(buf.index_of(b"\r\n", 0), Some(14));
    assert_eq!(buf.index_of(b"\r\n", 15), Some(23));
    assert_eq!(buf.index_of(b"\r\n\r\n", 0), Some(23));
    assert_eq!(buf.index_of(b"missing", 0), None);
    assert_eq!(buf.index_of(b"\r\n", 100), None);
}

#[test]
fn test_index_of_across_separate_pushes() {
    let mut buf = ByteBuffer::with_capacity(4);
    buf.push(b"ab\r");
    buf.push(b"\ncd");

    assert_eq!(buf.index_of(b"\r\n", 0), Some(2));
}
