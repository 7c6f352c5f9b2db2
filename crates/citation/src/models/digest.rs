use super::Article;

/// A subset of a digest's articles gathered under one theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleGroup {
    pub theme: String,
    pub articles: Vec<Article>,
}

/// A generated digest, as handed over by the generation pipeline.
///
/// The order of `articles` is significant: citation marker `[[N]]` in the
/// summary refers to `articles[N - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub id: String,
    pub title: String,
    /// Markdown containing citation markers.
    pub summary: String,
    pub articles: Vec<Article>,
    pub article_groups: Vec<ArticleGroup>,
}
impl Digest {
    /// Distinct theme names across all article groups, in first-seen order.
    pub fn theme_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.article_groups.len());
        for group in &self.article_groups {
            let name = group.theme.trim();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// IDs of the digest's articles, in citation order.
    pub fn article_ids(&self) -> Vec<i64> {
        self.articles.iter().map(|a| a.id).collect()
    }
}
