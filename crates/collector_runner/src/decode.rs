use encoding_rs::{Encoding, UTF_8};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown output encoding label {0:?}")]
    UnknownLabel(String),
    #[error("output encoding {0} cannot be split on newline bytes")]
    NotAsciiCompatible(&'static str),
}

/// Turns raw worker output lines into text.
///
/// Order: BOM -> configured encoding -> UTF-8. Malformed sequences are replaced,
/// never rejected; a worker writing garbage still produces progress lines.
#[derive(Debug, Clone, Copy)]
pub struct LineDecoder {
    encoding: &'static Encoding,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self { encoding: UTF_8 }
    }
}

impl LineDecoder {
    pub fn for_label(label: Option<&str>) -> Result<Self, DecodeError> {
        match label.map(str::trim).filter(|label| !label.is_empty()) {
            None => Ok(Self::default()),
            Some(label) => {
                let encoding = Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| DecodeError::UnknownLabel(label.to_string()))?;
                // Lines are cut on a raw 0x0A before decoding.
                if !encoding.is_ascii_compatible() {
                    return Err(DecodeError::NotAsciiCompatible(encoding.name()));
                }
                Ok(Self { encoding })
            }
        }
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            return text.into_owned();
        }
        let (text, _) = self.encoding.decode_without_bom_handling(bytes);
        text.into_owned()
    }
}
