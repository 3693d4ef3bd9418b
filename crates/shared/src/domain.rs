use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(FormId);
id_newtype!(FolderId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Published,
    Draft,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Published,
    Draft,
    Closed,
}

impl StatusFilter {
    pub fn matches(self, status: FormStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Published => status == FormStatus::Published,
            StatusFilter::Draft => status == FormStatus::Draft,
            StatusFilter::Closed => status == FormStatus::Closed,
        }
    }
}

/// A dragged item, decoded from the interaction layer's opaque token
/// (`form-<id>` or `folder-<id>`) once at the drag-start boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragItem {
    Form(FormId),
    Folder(FolderId),
}

impl DragItem {
    pub fn from_token(token: &str) -> Option<Self> {
        if let Some(id) = token.strip_prefix("form-") {
            if !id.is_empty() {
                return Some(DragItem::Form(FormId::new(id)));
            }
        }
        if let Some(id) = token.strip_prefix("folder-") {
            if !id.is_empty() {
                return Some(DragItem::Folder(FolderId::new(id)));
            }
        }
        None
    }
}

/// A drop destination. The flat area outside every folder is addressed by
/// the `standalone-forms` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Folder(FolderId),
    Unassigned,
}

impl DropTarget {
    pub fn from_token(token: &str) -> Option<Self> {
        if let Some(id) = token.strip_prefix("folder-") {
            if !id.is_empty() {
                return Some(DropTarget::Folder(FolderId::new(id)));
            }
        }
        if token == "standalone-forms" {
            return Some(DropTarget::Unassigned);
        }
        None
    }
}
