/// A named theme that digests can be grouped under. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Theme {
    pub id: i64,
    pub name: String,
}
