//! Image upload placeholders.
//!
//! `begin_upload` drops an image with `props.uploading = true` into the
//! document and hands back a ticket. `finish_upload` resolves the ticket:
//! success fills in the URL and clears the flag, failure removes the
//! placeholder. A ticket whose placeholder was deleted meanwhile is ignored.

use async_trait::async_trait;
use mdforge_core::{Document, Element, ElementKind, EditorError, Node, Path};
use mdforge_logging::EditorOperation;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::EditorEvent;
use crate::store::EditorStore;

pub type UploadTicket = Uuid;

pub const UPLOADING_PROP: &str = "uploading";
pub const UPLOAD_ID_PROP: &str = "uploadId";

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Host-side storage for pasted or dropped images.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Store the file and return its public URL.
    async fn upload(&self, file: &UploadFile) -> anyhow::Result<String>;
}

impl EditorStore {
    /// Insert a placeholder image after the block holding the selection (or
    /// at the end of the document). `None` when the editor is read-only.
    pub fn begin_upload(&mut self, file: &UploadFile) -> Option<UploadTicket> {
        let ticket = Uuid::new_v4();
        let mut props = Map::new();
        props.insert(UPLOADING_PROP.to_string(), Value::Bool(true));
        props.insert(UPLOAD_ID_PROP.to_string(), Value::String(ticket.to_string()));

        let image = Element::void(ElementKind::Image { url: String::new(), alt: file.name.clone(), title: None })
            .with_props(props);
        let index = self
            .selection
            .as_ref()
            .and_then(|range| range.focus.path.first())
            .map_or(self.doc.children.len(), |block| block + 1);

        let placeholder = Element::paragraph(vec![image.into()]);
        if !self.commit("begin_upload", |tx| tx.insert_nodes(&[index], vec![placeholder.into()]))? {
            return None;
        }
        self.ops.log(EditorOperation::Upload { ticket: ticket.to_string(), outcome: "started".to_string() });
        self.events.publish(EditorEvent::UploadStarted(ticket));
        Some(ticket)
    }

    /// Resolve an upload. Returns whether a placeholder was updated.
    pub fn finish_upload(&mut self, ticket: UploadTicket, result: Result<String, EditorError>) -> bool {
        let Some(path) = find_placeholder(&self.doc, ticket) else {
            debug!(%ticket, "Upload placeholder is gone, ignoring result");
            return false;
        };
        let ok = result.is_ok();
        let applied = self
            .commit("finish_upload", |tx| match result {
                Ok(url) => tx.update_element(&path, |el| {
                    if let ElementKind::Image { url: current, .. } = &mut el.kind {
                        *current = url;
                    }
                    el.props.remove(UPLOADING_PROP);
                    el.props.remove(UPLOAD_ID_PROP);
                }),
                Err(e) => {
                    warn!(%ticket, error = %e, "Image upload failed, removing placeholder");
                    let parent = &path[..path.len() - 1];
                    let lone = !parent.is_empty()
                        && tx.document().node(parent).is_some_and(|p| p.children().len() == 1);
                    tx.remove_node(if lone { parent } else { &path })
                }
            })
            .unwrap_or(false);

        if applied {
            let outcome = if ok { "uploaded" } else { "failed" };
            self.ops.log(EditorOperation::Upload { ticket: ticket.to_string(), outcome: outcome.to_string() });
            self.events.publish(EditorEvent::UploadFinished { ticket, ok });
        }
        applied
    }

    /// Whether the document still holds the placeholder for `ticket`.
    pub fn is_uploading(&self, ticket: UploadTicket) -> bool {
        find_placeholder(&self.doc, ticket).is_some()
    }
}

fn find_placeholder(doc: &Document, ticket: UploadTicket) -> Option<Path> {
    let id = ticket.to_string();
    let mut path = Vec::new();
    doc.children.iter().enumerate().find_map(|(i, node)| {
        path.clear();
        path.push(i);
        find_in(node, &id, &mut path)
    })
}

fn find_in(node: &Node, id: &str, path: &mut Path) -> Option<Path> {
    let Node::Element(el) = node else {
        return None;
    };
    if matches!(el.kind, ElementKind::Image { .. })
        && el.props.get(UPLOAD_ID_PROP).and_then(Value::as_str) == Some(id)
    {
        return Some(path.clone());
    }
    for (i, child) in el.children.iter().enumerate() {
        path.push(i);
        if let Some(found) = find_in(child, id, path) {
            return Some(found);
        }
        path.pop();
    }
    None
}

/// Upload `file` through `uploader`, keeping a placeholder in the document
/// while the request runs. The store lock is not held across the upload.
/// Returns the URL when the placeholder was still there to receive it.
pub async fn upload_image(
    store: &Mutex<EditorStore>,
    uploader: &dyn ImageUploader,
    file: UploadFile,
) -> Result<Option<String>, EditorError> {
    let ticket = store
        .lock()
        .await
        .begin_upload(&file)
        .ok_or_else(|| EditorError::Upload("editor is read-only".to_string()))?;

    match uploader.upload(&file).await {
        Ok(url) => {
            let applied = store.lock().await.finish_upload(ticket, Ok(url.clone()));
            Ok(applied.then_some(url))
        }
        Err(e) => {
            let message = format!("{}: {e:#}", file.name);
            store.lock().await.finish_upload(ticket, Err(EditorError::Upload(message.clone())));
            Err(EditorError::Upload(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EditorOptions;
    use std::sync::Arc;

    fn file() -> UploadFile {
        UploadFile { name: "cat.png".into(), content_type: "image/png".into(), bytes: vec![0x89, 0x50] }
    }

    fn image_at(store: &EditorStore, path: &[usize]) -> Element {
        store.document().node(path).and_then(Node::as_element).cloned().unwrap()
    }

    #[test]
    fn placeholder_then_success() {
        let mut store = EditorStore::default();
        store.set_markdown("Intro\n\nOutro");
        store.select(mdforge_core::Range::collapsed(mdforge_core::Point::new(vec![0, 0], 2)));

        let ticket = store.begin_upload(&file()).unwrap();
        let placeholder = image_at(&store, &[1, 0]);
        assert_eq!(placeholder.props.get(UPLOADING_PROP), Some(&Value::Bool(true)));
        assert!(store.is_uploading(ticket));

        assert!(store.finish_upload(ticket, Ok("https://cdn.example/cat.png".into())));
        let image = image_at(&store, &[1, 0]);
        assert!(image.props.is_empty());
        assert_eq!(store.get_markdown(), "Intro\n\n![cat.png](https://cdn.example/cat.png)\n\nOutro");
        assert!(!store.is_uploading(ticket));
    }

    #[test]
    fn failure_removes_placeholder() {
        let mut store = EditorStore::default();
        store.set_markdown("Body");
        let ticket = store.begin_upload(&file()).unwrap();
        assert!(store.finish_upload(ticket, Err(EditorError::Upload("timeout".into()))));
        assert!(!store.is_uploading(ticket));
        assert!(!store.get_markdown().contains("cat.png"));
    }

    #[test]
    fn deleted_placeholder_ignores_result() {
        let mut store = EditorStore::default();
        store.set_markdown("Body");
        let ticket = store.begin_upload(&file()).unwrap();
        assert!(store.remove_node(&[1]));
        let version = store.version();
        assert!(!store.finish_upload(ticket, Ok("https://cdn.example/late.png".into())));
        assert_eq!(store.version(), version);
    }

    struct FixedUploader(anyhow::Result<String>);

    #[async_trait]
    impl ImageUploader for FixedUploader {
        async fn upload(&self, _file: &UploadFile) -> anyhow::Result<String> {
            match &self.0 {
                Ok(url) => Ok(url.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    #[tokio::test]
    async fn upload_image_end_to_end() {
        let store = Arc::new(Mutex::new(EditorStore::new(EditorOptions::default())));
        let ok = FixedUploader(Ok("https://cdn.example/a.png".into()));
        let url = upload_image(&store, &ok, file()).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.example/a.png"));

        let failing = FixedUploader(Err(anyhow::anyhow!("quota exceeded")));
        let err = upload_image(&store, &failing, file()).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(store.lock().await.get_markdown().matches("![").count(), 1);
    }
}
