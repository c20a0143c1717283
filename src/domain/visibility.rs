//! The visibility policy: the single source of truth for who may read and
//! who may change a post or comment. Every feed, detail view and mutation
//! path goes through these predicates instead of re-deriving the rules.
//!
//! Time is always passed in by the caller. Whether a scheduled post has
//! become visible is decided per request against that instant; nothing is
//! precomputed or cached.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::post::PostView;

/// The identity making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        matches!(self, Viewer::User(id) if *id == user_id)
    }
}

/// The public predicate: published, publication instant reached, and the
/// category (if any) itself published.
pub fn is_publicly_visible(view: &PostView, now: DateTime<Utc>) -> bool {
    view.post.is_published
        && view.post.pub_date <= now
        && view.category.as_ref().is_none_or(|c| c.is_published)
}

/// Authors always see their own posts, in whatever publication state;
/// everyone else only sees what the public predicate admits.
pub fn can_read(viewer: &Viewer, view: &PostView, now: DateTime<Utc>) -> bool {
    viewer.is(view.post.author_id) || is_publicly_visible(view, now)
}

/// Strict single-owner rule. No admin or staff bypass exists.
pub fn can_mutate(viewer: &Viewer, author_id: Uuid) -> bool {
    viewer.is(author_id)
}

/// Query form of the policy, handed to the entity store by the query
/// builder. A `None` field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// Only posts with `pub_date <= t`.
    pub published_before: Option<DateTime<Utc>>,
    /// Only posts with `is_published = true`.
    pub published_only: bool,
    /// Only posts without a category or whose category is published.
    pub require_published_category: bool,
}

impl PostFilter {
    /// Everything, no constraints. Used for an author browsing their own
    /// profile feed.
    pub fn all() -> Self {
        Self::default()
    }

    /// The public predicate of §"publicly visible", as a store filter.
    /// Must agree with [`is_publicly_visible`] row-for-row.
    pub fn publicly_visible(now: DateTime<Utc>) -> Self {
        Self {
            published_before: Some(now),
            published_only: true,
            require_published_category: true,
            ..Self::default()
        }
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// In-process evaluation of the filter, used by the in-memory store.
    /// The SQL adapter renders the same conditions; the two backends must
    /// never disagree.
    pub fn matches(&self, view: &PostView) -> bool {
        if let Some(author_id) = self.author_id {
            if view.post.author_id != author_id {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if view.post.category_id != Some(category_id) {
                return false;
            }
        }
        if let Some(t) = self.published_before {
            if view.post.pub_date > t {
                return false;
            }
        }
        if self.published_only && !view.post.is_published {
            return false;
        }
        if self.require_published_category
            && !view.category.as_ref().is_none_or(|c| c.is_published)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::post::Post;
    use chrono::Duration;

    fn view(
        author_id: Uuid,
        pub_date: DateTime<Utc>,
        is_published: bool,
        category: Option<Category>,
    ) -> PostView {
        let post = Post {
            id: Uuid::new_v4(),
            title: "title".into(),
            text: "text".into(),
            image: None,
            pub_date,
            is_published,
            author_id,
            location_id: None,
            category_id: category.as_ref().map(|c| c.id),
            created_at: pub_date,
        };
        PostView {
            post,
            author_username: "author".into(),
            category,
            location: None,
            comment_count: 0,
        }
    }

    fn category(is_published: bool) -> Category {
        Category {
            is_published,
            ..Category::new("cat".into(), "desc".into(), "cat".into())
        }
    }

    #[test]
    fn published_past_post_is_readable_by_anyone() {
        let now = Utc::now();
        let v = view(Uuid::new_v4(), now - Duration::days(1), true, None);
        assert!(can_read(&Viewer::Anonymous, &v, now));
        assert!(can_read(&Viewer::User(Uuid::new_v4()), &v, now));
    }

    #[test]
    fn future_post_is_readable_only_by_its_author() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let v = view(author, now + Duration::days(1), true, None);
        assert!(can_read(&Viewer::User(author), &v, now));
        assert!(!can_read(&Viewer::User(Uuid::new_v4()), &v, now));
        assert!(!can_read(&Viewer::Anonymous, &v, now));
    }

    #[test]
    fn unpublished_post_is_readable_only_by_its_author() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let v = view(author, now - Duration::days(1), false, None);
        assert!(can_read(&Viewer::User(author), &v, now));
        assert!(!can_read(&Viewer::User(Uuid::new_v4()), &v, now));
    }

    #[test]
    fn unpublished_category_hides_the_post_from_others() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let v = view(author, now - Duration::days(1), true, Some(category(false)));
        assert!(!is_publicly_visible(&v, now));
        assert!(can_read(&Viewer::User(author), &v, now));
        assert!(!can_read(&Viewer::Anonymous, &v, now));
    }

    #[test]
    fn pub_date_exactly_now_is_visible() {
        let now = Utc::now();
        let v = view(Uuid::new_v4(), now, true, Some(category(true)));
        assert!(is_publicly_visible(&v, now));
    }

    #[test]
    fn only_the_author_can_mutate() {
        let author = Uuid::new_v4();
        assert!(can_mutate(&Viewer::User(author), author));
        assert!(!can_mutate(&Viewer::User(Uuid::new_v4()), author));
        assert!(!can_mutate(&Viewer::Anonymous, author));
    }

    #[test]
    fn filter_agrees_with_the_public_predicate() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let cases = vec![
            view(author, now - Duration::days(1), true, None),
            view(author, now + Duration::days(1), true, None),
            view(author, now - Duration::days(1), false, None),
            view(author, now - Duration::days(1), true, Some(category(true))),
            view(author, now - Duration::days(1), true, Some(category(false))),
            view(author, now + Duration::days(1), false, Some(category(false))),
        ];
        let filter = PostFilter::publicly_visible(now);
        for v in &cases {
            assert_eq!(
                filter.matches(v),
                is_publicly_visible(v, now),
                "filter and predicate disagree on {:?}",
                v.post
            );
        }
    }

    #[test]
    fn filter_author_and_category_constraints() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let cat = category(true);
        let v = view(author, now - Duration::days(1), true, Some(cat.clone()));

        assert!(PostFilter::all().by_author(author).matches(&v));
        assert!(!PostFilter::all().by_author(Uuid::new_v4()).matches(&v));
        assert!(PostFilter::all().in_category(cat.id).matches(&v));
        assert!(!PostFilter::all().in_category(Uuid::new_v4()).matches(&v));
    }
}
