use crate::error::{Error, ErrorKind};
use crate::models::from_timestamp;
use digestr_citation::CitationRecord;
use exn::ResultExt;

#[derive(sqlx::FromRow)]
pub(crate) struct CitationRow {
    pub(crate) id: String,
    pub(crate) digest_id: String,
    pub(crate) article_id: i64,
    pub(crate) citation_number: i64,
    pub(crate) url: String,
    pub(crate) title: String,
    pub(crate) publisher: String,
    #[sqlx(default)]
    pub(crate) published_at: Option<i64>,
    pub(crate) accessed_at: i64,
    pub(crate) context: String,
    pub(crate) created_at: i64,
}
impl From<&CitationRecord> for CitationRow {
    fn from(record: &CitationRecord) -> Self {
        Self {
            id: record.id.clone(),
            digest_id: record.digest_id.clone(),
            article_id: record.article_id,
            citation_number: i64::from(record.citation_number),
            url: record.url.clone(),
            title: record.title.clone(),
            publisher: record.publisher.clone(),
            published_at: record.published_date.map(|d| d.unix_timestamp()),
            accessed_at: record.accessed_date.unix_timestamp(),
            context: record.context.clone(),
            created_at: record.created_at.unix_timestamp(),
        }
    }
}
impl TryFrom<CitationRow> for CitationRecord {
    type Error = Error;
    fn try_from(row: CitationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            digest_id: row.digest_id,
            article_id: row.article_id,
            citation_number: u32::try_from(row.citation_number)
                .or_raise(|| ErrorKind::InvalidData("citation number"))?,
            url: row.url,
            title: row.title,
            publisher: row.publisher,
            published_date: row
                .published_at
                .map(|ts| from_timestamp(ts, "citation published date"))
                .transpose()?,
            accessed_date: from_timestamp(row.accessed_at, "citation accessed date")?,
            context: row.context,
            created_at: from_timestamp(row.created_at, "citation creation date")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::UtcDateTime;

    #[test]
    fn test_row_to_model() {
        let row = CitationRow {
            id: "c0ffee".to_string(),
            digest_id: "weekly-42".to_string(),
            article_id: 3,
            citation_number: 2,
            url: "https://example.com/3".to_string(),
            title: "Heat pumps outsell gas boilers".to_string(),
            publisher: "Example News".to_string(),
            published_at: None,
            accessed_at: 1_760_000_000,
            context: "Heat pumps outsold gas boilers for the first time [[2]].".to_string(),
            created_at: 1_760_000_000,
        };
        let record = CitationRecord::try_from(row).unwrap();
        assert_eq!(record.citation_number, 2);
        assert_eq!(record.accessed_date, UtcDateTime::from_unix_timestamp(1_760_000_000).unwrap());
        assert_eq!(CitationRow::from(&record).citation_number, 2);
    }

    #[test]
    fn test_negative_number_is_rejected() {
        let row = CitationRow {
            id: String::new(),
            digest_id: String::new(),
            article_id: 1,
            citation_number: -1,
            url: String::new(),
            title: String::new(),
            publisher: String::new(),
            published_at: None,
            accessed_at: 0,
            context: String::new(),
            created_at: 0,
        };
        let err = CitationRecord::try_from(row).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidData("citation number")));
    }
}
