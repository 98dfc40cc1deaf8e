use reqwest::multipart::{Form, Part};

use crate::error::DispatchError;
use crate::state::Attachment;

/// Top-level request category; also picks the reply field to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Query,
    Input,
    Data,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Query => "query",
            Mode::Input => "input",
            Mode::Data => "data",
        }
    }

    pub fn all() -> Vec<Mode> {
        vec![Mode::Query, Mode::Input, Mode::Data]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Query => "Query",
            Mode::Input => "Input",
            Mode::Data => "Data",
        }
    }
}

/// Sub-operation of data mode, forwarded verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    Get,
    Delete,
    Similarity,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::Similarity => "similarity",
        }
    }

    pub fn all() -> Vec<Operation> {
        vec![Operation::Get, Operation::Delete, Operation::Similarity]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Operation::Get => "Get",
            Operation::Delete => "Delete",
            Operation::Similarity => "Similarity",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Operation::Get => Operation::Delete,
            Operation::Delete => Operation::Similarity,
            Operation::Similarity => Operation::Get,
        }
    }
}

/// What the composer emits on submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub attachment: Option<Attachment>,
    pub mode: Mode,
    pub operation: Option<Operation>,
}

impl Submission {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            attachment: None,
            mode: Mode::Query,
            operation: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode, operation: Option<Operation>) -> Self {
        self.mode = mode;
        self.operation = operation;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Payload of one backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub message: String,
    pub mode: Mode,
    pub operation: Option<Operation>,
    pub model: String,
    pub file: Option<Attachment>,
}

impl SendRequest {
    pub fn new(
        message: &str,
        mode: Mode,
        operation: Option<Operation>,
        model: &str,
        file: Option<Attachment>,
    ) -> Self {
        Self {
            message: message.to_string(),
            mode,
            // Only data mode carries an operation
            operation: if mode == Mode::Data { operation } else { None },
            model: model.to_string(),
            file,
        }
    }

    /// Text fields in the order they are sent
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("message", self.message.clone()),
            ("select", self.mode.as_str().to_string()),
            ("model", self.model.clone()),
        ];
        if let Some(operation) = self.operation {
            fields.push(("operation", operation.as_str().to_string()));
        }
        fields
    }

    /// Build the multipart body, reading the attached file if any
    pub async fn to_form(&self) -> Result<Form, DispatchError> {
        let mut form = Form::new();
        for (name, value) in self.text_fields() {
            form = form.text(name, value);
        }

        if let Some(file) = &self.file {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| DispatchError::Attachment {
                    path: file.path.clone(),
                    source,
                })?;
            form = form.part("file", Part::bytes(bytes).file_name(file.name.clone()));
        }

        Ok(form)
    }
}
