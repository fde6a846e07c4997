use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{Level, event};

use crate::host::{ContentId, ContentKind, Host};

/// Characters the editor draws unique ids from.
const UID_SOUP: &[u8] =
    b"!#$%()*+,-./:;=?@[]^_`{|}~ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const UID_LENGTH: usize = 20;

/// A content block living in the workspace.
#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub kind: ContentKind,
    pub shadow: bool,
    pub field: String,
    /// (procedure block id, input name) this block is plugged into.
    pub parent: Option<(String, String)>,
    pub initialized: bool,
}

/// An in-memory [`Host`]: an arena of content blocks plus a render log.
#[derive(Debug)]
pub struct Workspace {
    blocks: BTreeMap<ContentId, ContentBlock>,
    next_id: usize,
    /// Procedure block ids, in the order render requests arrived.
    renders: Vec<String>,
    rng: StdRng,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace::with_rng(StdRng::from_entropy())
    }

    /// A workspace whose generated ids are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Workspace::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Workspace {
            blocks: BTreeMap::new(),
            next_id: 0,
            renders: Vec::new(),
            rng,
        }
    }

    pub fn get(&self, id: ContentId) -> Option<&ContentBlock> {
        self.blocks.get(&id)
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn parent_of(&self, id: ContentId) -> Option<(&str, &str)> {
        self.blocks
            .get(&id)?
            .parent
            .as_ref()
            .map(|(block, input)| (block.as_str(), input.as_str()))
    }

    /// Number of content blocks not yet disposed.
    pub fn live_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn render_count(&self, block_id: &str) -> usize {
        self.renders.iter().filter(|id| *id == block_id).count()
    }

    /// Create a non-shadow block, as if the user had dragged it in.
    pub fn new_user_block(&mut self, kind: ContentKind, field: &str) -> ContentId {
        let id = self.new_block(kind);
        self.set_field_text(id, field);
        id
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Workspace::new()
    }
}

impl Host for Workspace {
    fn new_block(&mut self, kind: ContentKind) -> ContentId {
        let id = ContentId(self.next_id);
        self.next_id += 1;
        event!(Level::TRACE, "new {} block {}", kind.opcode(), id);
        self.blocks.insert(
            id,
            ContentBlock {
                kind,
                shadow: false,
                field: String::new(),
                parent: None,
                initialized: false,
            },
        );
        id
    }

    fn dispose(&mut self, id: ContentId) {
        if self.blocks.remove(&id).is_some() {
            event!(Level::TRACE, "disposed block {}", id);
        }
    }

    fn kind(&self, id: ContentId) -> Option<&ContentKind> {
        self.blocks.get(&id).map(|b| &b.kind)
    }

    fn is_shadow(&self, id: ContentId) -> bool {
        self.blocks.get(&id).is_some_and(|b| b.shadow)
    }

    fn set_shadow(&mut self, id: ContentId, shadow: bool) {
        if let Some(block) = self.blocks.get_mut(&id) {
            block.shadow = shadow;
        }
    }

    fn field_text(&self, id: ContentId) -> Option<&str> {
        let block = self.blocks.get(&id)?;
        block.kind.field_name()?;
        Some(&block.field)
    }

    fn set_field_text(&mut self, id: ContentId, text: &str) {
        if let Some(block) = self.blocks.get_mut(&id) {
            block.field = text.to_string();
        }
    }

    fn connect(&mut self, child: ContentId, parent: &str, input: &str) {
        if let Some(block) = self.blocks.get_mut(&child) {
            block.parent = Some((parent.to_string(), input.to_string()));
        }
    }

    fn disconnect(&mut self, child: ContentId) {
        if let Some(block) = self.blocks.get_mut(&child) {
            block.parent = None;
        }
    }

    fn init_render(&mut self, id: ContentId) {
        if let Some(block) = self.blocks.get_mut(&id) {
            block.initialized = true;
        }
    }

    fn render(&mut self, block_id: &str) {
        self.renders.push(block_id.to_string());
    }

    fn gen_uid(&mut self) -> String {
        (0..UID_LENGTH)
            .map(|_| UID_SOUP[self.rng.gen_range(0..UID_SOUP.len())] as char)
            .collect()
    }
}
