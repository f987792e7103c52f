use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;

use super::errors::{DomainError, DomainResult};

/// Decodificador tolerante: el relleno `=` es opcional y se ignoran los espacios.
const FORGIVING_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Bytes crudos con su tipo MIME.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Convierte un `data:` URI en un [`Blob`].
///
/// El payload se decodifica como base64 si la cabecera lo declara y, si no,
/// como texto escapado estilo `%XX` / `%uXXXX`. El MIME se copia tal cual.
pub fn data_uri_to_blob(uri: &str) -> DomainResult<Blob> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| DomainError::InvalidInput("data URI sin separador ','".into()))?;

    let bytes = if header.contains("base64") {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        FORGIVING_BASE64
            .decode(compact)
            .map_err(|e| DomainError::InvalidInput(format!("payload base64 inválido: {e}")))?
    } else {
        unescape_bytes(payload)
    };

    let (_, media) = header
        .split_once(':')
        .ok_or_else(|| DomainError::InvalidInput("data URI sin esquema".into()))?;
    // Solo el tramo entre el primer y el segundo ':' y hasta el primer ';'.
    let mime = media
        .split(':')
        .next()
        .and_then(|segment| segment.split(';').next())
        .unwrap_or_default()
        .to_string();

    Ok(Blob { mime, bytes })
}

pub fn encode_base64_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Un byte por unidad UTF-16 tras desescapar; los caracteres fuera de
/// Latin-1 conservan solo el byte bajo.
fn unescape_bytes(payload: &str) -> Vec<u8> {
    let units: Vec<u16> = payload.encode_utf16().collect();
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;

    while i < units.len() {
        let unit = units[i];
        if unit == u16::from(b'%') {
            let wide = units.get(i + 1) == Some(&u16::from(b'u'));
            if let Some(code) = hex_units(&units, i + 2, 4).filter(|_| wide) {
                out.push(code as u8);
                i += 6;
                continue;
            }
            if let Some(code) = hex_units(&units, i + 1, 2) {
                out.push(code as u8);
                i += 3;
                continue;
            }
        }
        out.push(unit as u8);
        i += 1;
    }
    out
}

fn hex_units(units: &[u16], start: usize, len: usize) -> Option<u16> {
    let digits = units.get(start..start + len)?;
    digits.iter().try_fold(0u16, |acc, &u| {
        let digit = char::from_u32(u32::from(u))?.to_digit(16)?;
        Some(acc * 16 + digit as u16)
    })
}
