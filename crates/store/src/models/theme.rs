use digestr_citation::Theme;

#[derive(sqlx::FromRow)]
pub(crate) struct ThemeRow {
    pub(crate) id: i64,
    pub(crate) name: String,
    #[allow(dead_code)]
    pub(crate) created_at: i64,
}
impl From<ThemeRow> for Theme {
    fn from(row: ThemeRow) -> Self {
        Self { id: row.id, name: row.name }
    }
}
