use serde_json::Value;

/// State shared by every interpreter node during one evaluation session.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// The document `$` refers to, including inside filters.
    pub root: &'a Value,
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Value) -> Self {
        Context { root }
    }
}
