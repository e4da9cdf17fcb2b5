use crate::error::CodecError;

pub fn check_len(input: &[u8], size: usize) -> Result<(), CodecError> {
    if input.len() < size {
        return Err(CodecError::Underflow(size - input.len()));
    }
    Ok(())
}

pub fn read_u8(input: &[u8]) -> Result<(&[u8], u8), CodecError> {
    check_len(input, 1)?;
    Ok((&input[1..], input[0]))
}

pub fn read_i8(input: &[u8]) -> Result<(&[u8], i8), CodecError> {
    check_len(input, 1)?;
    Ok((&input[1..], input[0] as i8))
}

macro_rules! reader {
    ( $fn:ident, $size:expr, $ret:ty) => {
        pub fn $fn(input: &[u8]) -> Result<(&[u8], $ret), crate::error::CodecError> {
            check_len(input, $size)?;
            let x = <byteorder::BigEndian as byteorder::ByteOrder>::$fn(input);
            Ok((&input[$size..], x))
        }
    };
}

reader!(read_u16, 2, u16);
reader!(read_i16, 2, i16);
reader!(read_u32, 4, u32);
reader!(read_i32, 4, i32);
reader!(read_u64, 8, u64);
reader!(read_i64, 8, i64);
reader!(read_f32, 4, f32);
reader!(read_f64, 8, f64);

pub fn read_exact(input: &[u8], size: usize) -> Result<(&[u8], &[u8]), CodecError> {
    check_len(input, size)?;
    Ok((&input[size..], &input[..size]))
}

/// Byte run with a 1-byte length prefix.
pub fn read_var8(input: &[u8]) -> Result<(&[u8], &[u8]), CodecError> {
    let (input, len) = read_u8(input)?;
    read_exact(input, len as usize)
}

/// Byte run with a 4-byte length prefix.
pub fn read_var32(input: &[u8]) -> Result<(&[u8], &[u8]), CodecError> {
    let (input, len) = read_u32(input)?;
    read_exact(input, len as usize)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::CodecError;

    #[test]
    fn scalar_reads_advance() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05];
        let (rest, value) = read_u16(&bytes).unwrap();
        assert_eq!(value, 0x0102);
        let (rest, value) = read_u8(rest).unwrap();
        assert_eq!(value, 0x03);
        assert_eq!(rest, &[0x04, 0x05]);
    }

    #[test]
    fn short_input_underflows() {
        let bytes = [0x01, 0x02];
        assert_eq!(read_u32(&bytes), Err(CodecError::Underflow(2)));
        assert_eq!(read_exact(&bytes, 5), Err(CodecError::Underflow(3)));
    }

    #[test]
    fn var_runs() {
        let bytes = [0x03, b'a', b'b', b'c', 0xff];
        let (rest, run) = read_var8(&bytes).unwrap();
        assert_eq!(run, b"abc");
        assert_eq!(rest, &[0xff]);
    }
}
