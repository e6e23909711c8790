//! Uploaded dataset file models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returned to the client after a successful upload.
///
/// Nothing else about the upload is recorded server-side; the file itself is
/// the only durable trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    /// Stored name, used for download.
    pub filename: String,
    /// Name the client sent.
    #[serde(rename = "originalname")]
    pub original_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type the client declared.
    pub mimetype: String,
    /// When the file was stored.
    pub upload_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_receipt_json_shape() {
        let receipt = UploadReceipt {
            filename: "1718000000000-a.csv".to_string(),
            original_name: "a.csv".to_string(),
            size: 10,
            mimetype: "text/csv".to_string(),
            upload_date: Utc.with_ymd_and_hms(2024, 6, 10, 6, 13, 20).unwrap(),
        };

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["filename"], "1718000000000-a.csv");
        assert_eq!(json["originalname"], "a.csv");
        assert_eq!(json["size"], 10);
        assert_eq!(json["mimetype"], "text/csv");
        assert_eq!(json["uploadDate"], "2024-06-10T06:13:20Z");
    }
}
