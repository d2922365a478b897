use crate::exif_reader::date_from_exif;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use exif::Reader;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

// Exif items and meta boxes are tiny in practice; anything past this is a
// malformed or adversarial file.
const BOX_READ_LIMIT: u64 = 16 * 1024 * 1024;

pub fn read_heic_date(path: &Path) -> Result<DateTime<Local>> {
    let mut file = File::open(path)
        .with_context(|| format!("HEICを開けませんでした: {}", path.display()))?;
    let file_len = file
        .metadata()
        .with_context(|| format!("HEICのサイズを取得できませんでした: {}", path.display()))?
        .len();

    let meta = find_box(&mut file, 0, file_len, *b"meta")
        .context("metaボックスが見つかりませんでした")?;
    let meta_len = meta.data_end.saturating_sub(meta.data_start);
    if meta_len < 4 || meta_len > BOX_READ_LIMIT {
        bail!("metaボックスのサイズが不正です: {meta_len}");
    }

    let mut meta_body = vec![0u8; meta_len as usize];
    file.seek(SeekFrom::Start(meta.data_start))
        .context("metaボックスへシークできませんでした")?;
    file.read_exact(&mut meta_body)
        .context("metaボックスを読めませんでした")?;

    // meta is a FullBox: 4 bytes of version/flags precede the child boxes
    let children = &meta_body[4..];
    let item_id = exif_item_id(children).context("Exifアイテムがitem infoにありません")?;
    let extent =
        exif_item_extent(children, item_id).context("Exifアイテムの位置情報がありません")?;
    if extent.length == 0 || extent.length > BOX_READ_LIMIT || extent.offset >= file_len {
        bail!("Exifアイテムの位置情報が不正です");
    }

    let mut payload = vec![0u8; extent.length as usize];
    file.seek(SeekFrom::Start(extent.offset))
        .context("Exifアイテムへシークできませんでした")?;
    file.read_exact(&mut payload)
        .context("Exifアイテムを読めませんでした")?;

    let tiff = exif_payload_tiff(&payload).context("Exifペイロードの形式が不正です")?;
    let exif = Reader::new()
        .read_raw(tiff.to_vec())
        .context("HEIC内のEXIFを解析できませんでした")?;

    date_from_exif(&exif).context("HEIC内に撮影日時タグがありません")
}

struct BoxRange {
    data_start: u64,
    data_end: u64,
}

fn find_box(file: &mut File, start: u64, end: u64, kind: [u8; 4]) -> Option<BoxRange> {
    let mut offset = start;
    while offset + 8 <= end {
        file.seek(SeekFrom::Start(offset)).ok()?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header).ok()?;
        let mut size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let found = [header[4], header[5], header[6], header[7]];
        let mut header_len = 8u64;

        if size == 1 {
            let mut ext = [0u8; 8];
            file.read_exact(&mut ext).ok()?;
            size = u64::from_be_bytes(ext);
            header_len = 16;
        } else if size == 0 {
            size = end.saturating_sub(offset);
        }
        if size < header_len {
            return None;
        }
        let box_end = offset.saturating_add(size).min(end);
        if box_end <= offset {
            return None;
        }

        if found == kind {
            return Some(BoxRange {
                data_start: offset + header_len,
                data_end: box_end,
            });
        }
        offset = box_end;
    }
    None
}

struct BoxIter<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Iterator for BoxIter<'a> {
    type Item = ([u8; 4], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor + 8 > self.data.len() {
            return None;
        }
        let mut size = be_u32(self.data, self.cursor)? as u64;
        let mut kind = [0u8; 4];
        kind.copy_from_slice(&self.data[self.cursor + 4..self.cursor + 8]);
        let mut header_len = 8usize;

        if size == 1 {
            size = be_u64(self.data, self.cursor + 8)?;
            header_len = 16;
        } else if size == 0 {
            size = (self.data.len() - self.cursor) as u64;
        }
        if size < header_len as u64 {
            return None;
        }
        let box_end = ((self.cursor as u64).saturating_add(size)).min(self.data.len() as u64) as usize;
        let body_start = self.cursor + header_len;
        if body_start > box_end {
            return None;
        }

        let body = &self.data[body_start..box_end];
        self.cursor = box_end;
        Some((kind, body))
    }
}

fn find_child<'a>(data: &'a [u8], kind: &[u8; 4]) -> Option<&'a [u8]> {
    BoxIter { data, cursor: 0 }
        .find(|(found, _)| found == kind)
        .map(|(_, body)| body)
}

fn exif_item_id(meta_children: &[u8]) -> Option<u32> {
    let iinf = find_child(meta_children, b"iinf")?;
    let version = *iinf.first()?;
    let entries_start = if version == 0 { 4 + 2 } else { 4 + 4 };
    let entries = iinf.get(entries_start..)?;

    for (kind, body) in (BoxIter { data: entries, cursor: 0 }) {
        if &kind != b"infe" {
            continue;
        }
        let infe_version = *body.first()?;
        let (item_id, item_type) = match infe_version {
            2 => (be_u16(body, 4)? as u32, body.get(8..12)?),
            3 => (be_u32(body, 4)?, body.get(10..14)?),
            _ => continue,
        };
        if item_type == b"Exif" {
            return Some(item_id);
        }
    }
    None
}

struct ItemExtent {
    offset: u64,
    length: u64,
}

fn exif_item_extent(meta_children: &[u8], target_id: u32) -> Option<ItemExtent> {
    let iloc = find_child(meta_children, b"iloc")?;
    let version = *iloc.first()?;
    let b4 = *iloc.get(4)?;
    let b5 = *iloc.get(5)?;
    let offset_size = (b4 >> 4) as usize;
    let length_size = (b4 & 0x0f) as usize;
    let base_offset_size = (b5 >> 4) as usize;
    let index_size = if version == 1 || version == 2 {
        (b5 & 0x0f) as usize
    } else {
        0
    };
    let (item_count, mut cursor) = if version < 2 {
        (be_u16(iloc, 6)? as u32, 8usize)
    } else {
        (be_u32(iloc, 6)?, 10usize)
    };

    for _ in 0..item_count {
        let item_id = if version < 2 {
            let id = be_u16(iloc, cursor)? as u32;
            cursor += 2;
            id
        } else {
            let id = be_u32(iloc, cursor)?;
            cursor += 4;
            id
        };
        let construction_method = if version == 1 || version == 2 {
            let raw = be_u16(iloc, cursor)? & 0x0f;
            cursor += 2;
            raw
        } else {
            0
        };
        cursor += 2; // data_reference_index
        let base_offset = read_sized(iloc, cursor, base_offset_size)?;
        cursor += base_offset_size;
        let extent_count = be_u16(iloc, cursor)?;
        cursor += 2;

        let mut first: Option<ItemExtent> = None;
        for index in 0..extent_count {
            if index_size > 0 {
                read_sized(iloc, cursor, index_size)?;
                cursor += index_size;
            }
            let extent_offset = read_sized(iloc, cursor, offset_size)?;
            cursor += offset_size;
            let extent_length = read_sized(iloc, cursor, length_size)?;
            cursor += length_size;
            if index == 0 {
                first = Some(ItemExtent {
                    offset: base_offset.checked_add(extent_offset)?,
                    length: extent_length,
                });
            }
        }

        if item_id == target_id {
            // only construction method 0 (absolute file offsets) is supported
            if construction_method != 0 {
                return None;
            }
            return first;
        }
    }
    None
}

fn exif_payload_tiff(payload: &[u8]) -> Option<&[u8]> {
    // ExifDataBlock: u32 offset to the TIFF header, then the payload itself
    let skip = be_u32(payload, 0)? as usize;
    let rest = payload.get(4 + skip..)?;
    if rest.len() >= 6 && &rest[..6] == b"Exif\0\0" {
        Some(&rest[6..])
    } else {
        Some(rest)
    }
}

fn read_sized(data: &[u8], at: usize, size: usize) -> Option<u64> {
    match size {
        0 => Some(0),
        4 => be_u32(data, at).map(u64::from),
        8 => be_u64(data, at),
        _ => None,
    }
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn be_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes = data.get(at..at.checked_add(8)?)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Some(u64::from_be_bytes(raw))
}
