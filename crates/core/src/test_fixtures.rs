//! Minimal hand-built image fixtures so metadata tests stay deterministic
//! without binary assets checked into the repository.

// TIFF little-endian layout used below:
//   0  header, IFD0 pointer = 8
//   8  IFD0: one entry, ExifIFD pointer (0x8769) -> 26
//   26 Exif IFD: one entry, DateTimeOriginal (0x9003) -> value at 44
//   44 20-byte ASCII "YYYY:MM:DD HH:MM:SS\0"
pub(crate) fn tiff_with_datetime(datetime: &str) -> Vec<u8> {
    let ascii = format!("{datetime}\0");
    assert_eq!(ascii.len(), 20, "fixture expects YYYY:MM:DD HH:MM:SS");

    let mut tiff = Vec::with_capacity(64);
    tiff.extend_from_slice(&[0x49, 0x49, 0x2a, 0x00]);
    tiff.extend_from_slice(&8u32.to_le_bytes());

    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&(ascii.len() as u32).to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(ascii.as_bytes());
    tiff
}

pub(crate) fn jpeg_with_datetime(datetime: &str) -> Vec<u8> {
    let tiff = tiff_with_datetime(datetime);
    let mut app1 = Vec::new();
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    let mut jpeg = vec![0xff, 0xd8];
    jpeg.extend_from_slice(&[0xff, 0xe1]);
    jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&app1);
    jpeg.extend_from_slice(&[0xff, 0xd9]);
    jpeg
}

pub(crate) fn heic_with_datetime(datetime: &str) -> Vec<u8> {
    let tiff = tiff_with_datetime(datetime);
    let mut exif_item = Vec::new();
    exif_item.extend_from_slice(&6u32.to_be_bytes());
    exif_item.extend_from_slice(b"Exif\0\0");
    exif_item.extend_from_slice(&tiff);

    let mut ftyp_body = Vec::new();
    ftyp_body.extend_from_slice(b"heic");
    ftyp_body.extend_from_slice(&0u32.to_be_bytes());
    ftyp_body.extend_from_slice(b"heic");
    let ftyp = build_box(b"ftyp", &ftyp_body);

    let mut hdlr_body = vec![0u8; 4];
    hdlr_body.extend_from_slice(&0u32.to_be_bytes());
    hdlr_body.extend_from_slice(b"pict");
    hdlr_body.extend_from_slice(&[0u8; 12]);
    hdlr_body.push(0);
    let hdlr = build_box(b"hdlr", &hdlr_body);

    let mut infe_body = vec![2, 0, 0, 0];
    infe_body.extend_from_slice(&1u16.to_be_bytes());
    infe_body.extend_from_slice(&0u16.to_be_bytes());
    infe_body.extend_from_slice(b"Exif");
    infe_body.push(0);
    let infe = build_box(b"infe", &infe_body);

    let mut iinf_body = vec![0u8; 4];
    iinf_body.extend_from_slice(&1u16.to_be_bytes());
    iinf_body.extend_from_slice(&infe);
    let iinf = build_box(b"iinf", &iinf_body);

    // iloc v0, offset_size = length_size = 4, one item with one extent
    let iloc_len = 8 + 4 + 2 + 2 + 2 + 2 + 2 + 4 + 4;
    let meta_len = 8 + 4 + hdlr.len() + iinf.len() + iloc_len;
    let exif_offset = (ftyp.len() + meta_len + 8) as u32;

    let mut iloc_body = vec![0u8; 4];
    iloc_body.push(0x44);
    iloc_body.push(0x00);
    iloc_body.extend_from_slice(&1u16.to_be_bytes());
    iloc_body.extend_from_slice(&1u16.to_be_bytes());
    iloc_body.extend_from_slice(&0u16.to_be_bytes());
    iloc_body.extend_from_slice(&1u16.to_be_bytes());
    iloc_body.extend_from_slice(&exif_offset.to_be_bytes());
    iloc_body.extend_from_slice(&(exif_item.len() as u32).to_be_bytes());
    let iloc = build_box(b"iloc", &iloc_body);
    assert_eq!(iloc.len(), iloc_len);

    let mut meta_body = vec![0u8; 4];
    meta_body.extend_from_slice(&hdlr);
    meta_body.extend_from_slice(&iinf);
    meta_body.extend_from_slice(&iloc);
    let meta = build_box(b"meta", &meta_body);
    assert_eq!(meta.len(), meta_len);

    let mdat = build_box(b"mdat", &exif_item);

    let mut heic = Vec::new();
    heic.extend_from_slice(&ftyp);
    heic.extend_from_slice(&meta);
    heic.extend_from_slice(&mdat);
    heic
}

fn build_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(&((body.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

#[cfg(test)]
mod tests {
    use super::{heic_with_datetime, jpeg_with_datetime};

    #[test]
    fn jpeg_fixture_carries_exif_marker() {
        let jpeg = jpeg_with_datetime("2023:06:15 10:30:05");
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
        assert!(jpeg.windows(6).any(|w| w == b"Exif\0\0"));
    }

    #[test]
    fn heic_fixture_places_exif_item_at_declared_offset() {
        let heic = heic_with_datetime("2023:06:15 10:30:05");
        assert_eq!(&heic[4..8], b"ftyp");
        // rposition: the item_type field in infe also reads "Exif", the
        // mdat payload is the last occurrence
        let exif_pos = heic
            .windows(6)
            .rposition(|w| w == b"Exif\0\0")
            .expect("exif payload present");
        // the 4-byte tiff-header offset sits right before the Exif marker
        assert_eq!(&heic[exif_pos - 4..exif_pos], &6u32.to_be_bytes());
    }
}
