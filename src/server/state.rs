use crate::pipeline::Pipeline;
use crate::storage::StorageLayout;

#[derive(Clone)]
pub struct ServerState {
    pub(crate) pipeline: Pipeline,
}

impl ServerState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub(crate) fn storage(&self) -> &StorageLayout {
        self.pipeline.storage()
    }
}
