use rmcp::model::{RawContent, ResourceContents};

/// One item of an MCP tool result, reduced to what the transcript can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolContent {
    Text(String),
    /// Binary payloads are not kept; only their media type is reported.
    Media { kind: &'static str, mime_type: String },
    Resource { uri: String, name: Option<String> },
}

impl ToolContent {
    fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Media { kind, mime_type } => format!("[{kind}: {mime_type}]"),
            Self::Resource {
                uri,
                name: Some(name),
            } => format!("[Resource: {name} ({uri})]"),
            Self::Resource { uri, name: None } => format!("[Resource: {uri}]"),
        }
    }
}

impl From<&rmcp::model::Content> for ToolContent {
    fn from(content: &rmcp::model::Content) -> Self {
        match &content.raw {
            RawContent::Text(text) => Self::Text(text.text.clone()),
            RawContent::Image(image) => Self::Media {
                kind: "Image",
                mime_type: image.mime_type.clone(),
            },
            RawContent::Audio(audio) => Self::Media {
                kind: "Audio",
                mime_type: audio.mime_type.clone(),
            },
            RawContent::Resource(embedded) => match &embedded.resource {
                ResourceContents::TextResourceContents { uri, text, .. } => {
                    Self::Text(format!("{uri}:\n{text}"))
                }
                ResourceContents::BlobResourceContents { uri, .. } => Self::Resource {
                    uri: uri.clone(),
                    name: None,
                },
            },
            RawContent::ResourceLink(link) => Self::Resource {
                uri: link.uri.clone(),
                name: Some(link.name.clone()),
            },
        }
    }
}

/// Flatten MCP result content to plain text, one item per line.
pub fn render_content_to_text(contents: &[rmcp::model::Content]) -> String {
    contents
        .iter()
        .map(|item| ToolContent::from(item).render())
        .collect::<Vec<_>>()
        .join("\n")
}
