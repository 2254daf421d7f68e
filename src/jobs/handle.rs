//! Remote job handle

/// Where a remote job stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState<T> {
    Pending,
    Completed(T),
    Failed(String),
}

/// Provider-assigned id plus the last observed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle<T> {
    pub id: String,
    pub state: JobState<T>,
}

impl<T> JobHandle<T> {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: JobState::Pending,
        }
    }

    pub fn completed(id: impl Into<String>, result: T) -> Self {
        Self {
            id: id.into(),
            state: JobState::Completed(result),
        }
    }

    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: JobState::Failed(reason.into()),
        }
    }
}
