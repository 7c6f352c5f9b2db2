use digestr_citation::ArticleGroup;

/// Article groups are stored by reference: the theme name and the IDs of the
/// articles in the group. The articles themselves live in their own table.
#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct ArticleGroupProxy {
    #[facet(rename = "t")]
    pub(crate) theme: String,
    #[facet(rename = "a")]
    pub(crate) articles: Vec<i64>,
}
impl From<&ArticleGroup> for ArticleGroupProxy {
    fn from(group: &ArticleGroup) -> Self {
        Self {
            theme: group.theme.clone(),
            articles: group.articles.iter().map(|a| a.id).collect(),
        }
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
#[facet(transparent)]
pub(crate) struct ThemeNameProxy(pub(crate) String);
impl From<&str> for ThemeNameProxy {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
