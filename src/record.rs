use serde::{Deserialize, Serialize};

/// One extracted cable, shaped the way it is stored.
///
/// `id` doubles as the store's primary key (`_id`) and the dedup key;
/// `reference_id` always mirrors it for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    #[serde(rename = "_id")]
    pub id: String,
    pub reference_id: String,
    pub date_time: String,
    pub classification: String,
    pub origin: String,
    pub header: String,
    pub body: String,
}

impl Cable {
    pub fn new(
        id: String,
        date_time: String,
        classification: String,
        origin: String,
        header: String,
        body: String,
    ) -> Self {
        Cable {
            reference_id: id.clone(),
            id,
            date_time,
            classification,
            origin,
            header,
            body,
        }
    }
}
