//! 32bit BMP 書き出し

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;

/// BGRA ピクセル列を非圧縮 32bit BMP として保存
///
/// `top_down` が true なら先頭行が画像の上端。
pub fn write_bmp(path: &Path, width: u32, height: u32, bgra: &[u8], top_down: bool) -> io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    encode_bmp(&mut out, width, height, bgra, top_down)?;
    out.flush()
}

pub(crate) fn encode_bmp<W: Write>(
    out: &mut W,
    width: u32,
    height: u32,
    bgra: &[u8],
    top_down: bool,
) -> io::Result<()> {
    let image_len = width as u64 * height as u64 * 4;
    if bgra.len() as u64 != image_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("pixel buffer is {} bytes, expected {}", bgra.len(), image_len),
        ));
    }
    let offset = FILE_HEADER_LEN + INFO_HEADER_LEN;
    let file_len = u32::try_from(offset as u64 + image_len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "image too large for BMP"))?;
    let signed_height = if top_down {
        -(height as i32)
    } else {
        height as i32
    };

    out.write_all(b"BM")?;
    out.write_all(&file_len.to_le_bytes())?;
    out.write_all(&0u32.to_le_bytes())?;
    out.write_all(&offset.to_le_bytes())?;

    out.write_all(&INFO_HEADER_LEN.to_le_bytes())?;
    out.write_all(&(width as i32).to_le_bytes())?;
    out.write_all(&signed_height.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?; // planes
    out.write_all(&32u16.to_le_bytes())?; // bpp
    out.write_all(&0u32.to_le_bytes())?; // BI_RGB
    out.write_all(&(image_len as u32).to_le_bytes())?;
    out.write_all(&2835i32.to_le_bytes())?; // 72 dpi
    out.write_all(&2835i32.to_le_bytes())?;
    out.write_all(&0u32.to_le_bytes())?;
    out.write_all(&0u32.to_le_bytes())?;

    out.write_all(bgra)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn header_describes_top_down_image() {
        let pixels = vec![0u8; 2 * 3 * 4];
        let mut out = Vec::new();
        encode_bmp(&mut out, 2, 3, &pixels, true).unwrap();

        assert_eq!(&out[..2], b"BM");
        assert_eq!(le_u32(&out, 2) as usize, out.len());
        assert_eq!(le_u32(&out, 10), 54);
        assert_eq!(le_u32(&out, 18), 2);
        assert_eq!(le_u32(&out, 22) as i32, -3);
        assert_eq!(u16::from_le_bytes([out[28], out[29]]), 32);
        assert_eq!(out.len(), 54 + pixels.len());
    }

    #[test]
    fn bottom_up_keeps_positive_height() {
        let pixels = vec![0xFFu8; 4];
        let mut out = Vec::new();
        encode_bmp(&mut out, 1, 1, &pixels, false).unwrap();
        assert_eq!(le_u32(&out, 22) as i32, 1);
        assert_eq!(&out[54..], &pixels[..]);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let mut out = Vec::new();
        let err = encode_bmp(&mut out, 4, 4, &[0u8; 8], true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screenshot.bmp");
        write_bmp(&path, 1, 2, &[1, 2, 3, 4, 5, 6, 7, 8], true).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 62);
    }
}
