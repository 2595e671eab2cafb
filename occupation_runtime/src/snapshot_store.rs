//! Occupation frame store: binary protobuf payload.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - One frame per occupation, in occupation id order
//!   - The file is written whole and fsynced; it is never appended to
//!   - Zero-length or oversized frames are rejected on read

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use prost::Message;

use crate::error::{Result, RuntimeError};
use crate::proto_types::ProtoOccupation;

/// Largest frame accepted on read.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Write every occupation as one frame and fsync. Returns the bytes written.
pub fn write_frames(path: &Path, occupations: &[ProtoOccupation]) -> Result<Vec<u8>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RuntimeError::io(parent, e))?;
    }

    let mut bytes = Vec::new();
    for occupation in occupations {
        let buf = occupation.encode_to_vec();
        if buf.is_empty() || buf.len() > MAX_FRAME_LEN {
            return Err(RuntimeError::integrity(format!(
                "occupation {} encodes to an invalid frame length {}",
                occupation.occupation_id,
                buf.len()
            )));
        }
        bytes.extend_from_slice(&(buf.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&buf);
    }

    let mut file = File::create(path).map_err(|e| RuntimeError::io(path, e))?;
    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(&bytes).map_err(|e| RuntimeError::io(path, e))?;
        writer.flush().map_err(|e| RuntimeError::io(path, e))?;
    }
    file.sync_all().map_err(|e| RuntimeError::io(path, e))?;

    Ok(bytes)
}

/// Read the raw payload bytes.
pub fn read_payload(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(RuntimeError::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| RuntimeError::io(path, e))?;
    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| RuntimeError::io(path, e))?;
    Ok(bytes)
}

/// Decode every frame in `bytes`, validating frame integrity.
pub fn decode_frames(bytes: &[u8]) -> Result<Vec<ProtoOccupation>> {
    let mut reader = bytes;
    let mut occupations = Vec::new();

    while !reader.is_empty() {
        if reader.len() < 4 {
            return Err(RuntimeError::integrity("truncated frame header"));
        }
        let (header, rest) = reader.split_at(4);
        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(header);
        reader = rest;

        let len = u32::from_le_bytes(len_buf) as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(RuntimeError::integrity(format!("invalid frame length: {len}")));
        }
        if reader.len() < len {
            return Err(RuntimeError::integrity(format!(
                "truncated frame: {len} bytes declared, {} left",
                reader.len()
            )));
        }

        let (frame, rest) = reader.split_at(len);
        occupations.push(ProtoOccupation::decode(frame)?);
        reader = rest;
    }

    Ok(occupations)
}
