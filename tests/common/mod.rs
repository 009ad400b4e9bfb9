//! Builds small ZIP archives in memory for the integration tests.

#![allow(dead_code)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;

/// One entry as it will be written, including fields a test may falsify.
pub struct RawEntry {
    pub name: String,
    pub method: u16,
    pub flags: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub payload: Vec<u8>,
}

impl RawEntry {
    pub fn stored(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            method: 0,
            flags: 0,
            crc32: crc32(content),
            compressed_size: content.len() as u32,
            uncompressed_size: content.len() as u32,
            payload: content.to_vec(),
        }
    }

    pub fn deflated(name: &str, content: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(content).unwrap();
        let payload = encoder.finish().unwrap();
        Self {
            name: name.to_string(),
            method: 8,
            flags: 0,
            crc32: crc32(content),
            compressed_size: payload.len() as u32,
            uncompressed_size: content.len() as u32,
            payload,
        }
    }
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<RawEntry>,
    comment: Vec<u8>,
    zip64: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push(RawEntry::stored(name, content));
        self
    }

    pub fn deflated(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push(RawEntry::deflated(name, content));
        self
    }

    pub fn directory(self, name: &str) -> Self {
        assert!(name.ends_with('/'));
        self.stored(name, b"")
    }

    pub fn raw(mut self, entry: RawEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Write ZIP64 end records and move entry sizes into ZIP64 extra fields.
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let lfh_offset = out.len() as u32;

            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(entry.flags).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0x21).unwrap();
            out.write_u32::<LittleEndian>(entry.crc32).unwrap();
            out.write_u32::<LittleEndian>(entry.compressed_size).unwrap();
            out.write_u32::<LittleEndian>(entry.uncompressed_size).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&entry.payload);

            let (compressed, uncompressed, extra) = if self.zip64 {
                let mut extra = Vec::new();
                extra.write_u16::<LittleEndian>(0x0001).unwrap();
                extra.write_u16::<LittleEndian>(16).unwrap();
                extra
                    .write_u64::<LittleEndian>(entry.uncompressed_size as u64)
                    .unwrap();
                extra
                    .write_u64::<LittleEndian>(entry.compressed_size as u64)
                    .unwrap();
                (0xFFFFFFFF, 0xFFFFFFFF, extra)
            } else {
                (entry.compressed_size, entry.uncompressed_size, Vec::new())
            };

            central.extend_from_slice(b"PK\x01\x02");
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(entry.flags).unwrap();
            central.write_u16::<LittleEndian>(entry.method).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0x21).unwrap();
            central.write_u32::<LittleEndian>(entry.crc32).unwrap();
            central.write_u32::<LittleEndian>(compressed).unwrap();
            central.write_u32::<LittleEndian>(uncompressed).unwrap();
            central
                .write_u16::<LittleEndian>(entry.name.len() as u16)
                .unwrap();
            central.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(lfh_offset).unwrap();
            central.extend_from_slice(entry.name.as_bytes());
            central.extend_from_slice(&extra);
        }

        let cd_offset = out.len() as u64;
        let cd_size = central.len() as u64;
        let count = self.entries.len() as u64;
        out.extend_from_slice(&central);

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            out.write_u64::<LittleEndian>(44).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(count).unwrap();
            out.write_u64::<LittleEndian>(count).unwrap();
            out.write_u64::<LittleEndian>(cd_size).unwrap();
            out.write_u64::<LittleEndian>(cd_offset).unwrap();

            out.extend_from_slice(b"PK\x06\x07");
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
            out.write_u32::<LittleEndian>(1).unwrap();
        }

        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        if self.zip64 {
            out.write_u16::<LittleEndian>(0xFFFF).unwrap();
            out.write_u16::<LittleEndian>(0xFFFF).unwrap();
            out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
            out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        } else {
            out.write_u16::<LittleEndian>(count as u16).unwrap();
            out.write_u16::<LittleEndian>(count as u16).unwrap();
            out.write_u32::<LittleEndian>(cd_size as u32).unwrap();
            out.write_u32::<LittleEndian>(cd_offset as u32).unwrap();
        }
        out.write_u16::<LittleEndian>(self.comment.len() as u16)
            .unwrap();
        out.extend_from_slice(&self.comment);
        out
    }
}
