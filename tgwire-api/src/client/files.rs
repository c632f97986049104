//! File-upload sources and multipart form construction.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use super::ClientError;

/// A file to upload with a send method.
///
/// The remote API accepts three sources: an id of a file already on its
/// servers, a URL it will fetch itself, or the bytes uploaded inline as
/// a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    /// Re-send a file already stored on the platform.
    FileId(String),
    /// Let the platform fetch the file from a public URL.
    Url(String),
    /// Upload in-memory bytes under the given file name.
    Bytes { file_name: String, data: Bytes },
}

impl InputFile {
    pub fn file_id(id: impl Into<String>) -> Self {
        InputFile::FileId(id.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        InputFile::Url(url.into())
    }

    pub fn bytes(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        InputFile::Bytes {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Attach this file to `form` under the method's field name
    /// (`photo`, `document`, …).
    pub(crate) fn attach(self, form: Form, field: &'static str) -> Form {
        match self {
            InputFile::FileId(value) | InputFile::Url(value) => form.text(field, value),
            InputFile::Bytes { file_name, data } => {
                form.part(field, Part::stream(data).file_name(file_name))
            }
        }
    }
}

/// Serialize `params` into text parts of a multipart form.
///
/// String fields are sent verbatim; everything else as its JSON
/// rendering, which is how the remote API expects structured values
/// inside multipart bodies.
pub(crate) fn form_with_params<P: Serialize>(params: &P) -> Result<Form, ClientError> {
    let value = serde_json::to_value(params)?;
    let mut form = Form::new();
    if let serde_json::Value::Object(fields) = value {
        for (name, field) in fields {
            let text = match field {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            form = form.text(name, text);
        }
    }
    Ok(form)
}
