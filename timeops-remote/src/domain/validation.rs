use serde::Deserialize;

/// Body shape of an HTTP 400 response. Only the first message is surfaced.
#[derive(Debug, Deserialize)]
pub struct ValidationBody {
    #[serde(default)]
    pub errors: Vec<ValidationMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ValidationMessage {
    pub msg: String,
}

impl ValidationBody {
    pub fn first_message(self) -> Option<String> {
        self.errors.into_iter().next().map(|e| e.msg)
    }
}
