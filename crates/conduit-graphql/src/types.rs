use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use conduit_util::pagination::Page;

/// Account payload with the session token attached.
#[derive(SimpleObject)]
pub struct User {
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub token: String,
}

impl From<conduit_models::user::User> for User {
    fn from(u: conduit_models::user::User) -> Self {
        Self {
            email: u.email,
            username: u.username,
            bio: u.bio,
            image: u.image,
            token: u.token,
        }
    }
}

#[derive(SimpleObject)]
pub struct Profile {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub following: bool,
}

impl From<conduit_models::user::Profile> for Profile {
    fn from(p: conduit_models::user::Profile) -> Self {
        Self {
            username: p.username,
            bio: p.bio,
            image: p.image,
            following: p.following,
        }
    }
}

/// Article node. `id` doubles as the pagination cursor. Comments are
/// resolved lazily as their own connection field.
#[derive(SimpleObject)]
#[graphql(complex)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: Profile,
}

impl From<conduit_models::article::Article> for Article {
    fn from(a: conduit_models::article::Article) -> Self {
        Self {
            id: a.id,
            slug: a.slug,
            title: a.title,
            description: a.description,
            body: a.body,
            tag_list: a.tag_list,
            created_at: a.created_at,
            updated_at: a.updated_at,
            favorited: a.favorited,
            favorites_count: a.favorites_count,
            author: a.author.into(),
        }
    }
}

#[derive(SimpleObject)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Profile,
}

impl From<conduit_models::comment::Comment> for Comment {
    fn from(c: conduit_models::comment::Comment) -> Self {
        Self {
            id: c.id,
            body: c.body,
            created_at: c.created_at,
            updated_at: c.updated_at,
            author: c.author.into(),
        }
    }
}

/// Relay-style paging metadata. Cursors are null on an empty page.
#[derive(SimpleObject)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// Generate Relay-style connection types (Edge + Connection) with a From
/// impl off the domain page.
macro_rules! define_connection {
    ($node:ty, $model:ty, $edge:ident, $connection:ident) => {
        #[derive(SimpleObject)]
        pub struct $edge {
            pub node: $node,
            pub cursor: String,
        }

        #[derive(SimpleObject)]
        pub struct $connection {
            pub edges: Vec<$edge>,
            pub page_info: PageInfo,
        }

        impl From<Page<$model>> for $connection {
            fn from(page: Page<$model>) -> Self {
                let page_info = PageInfo {
                    has_next_page: page.has_next(),
                    has_previous_page: page.has_previous(),
                    start_cursor: (!page.start_cursor().is_empty())
                        .then(|| page.start_cursor().to_string()),
                    end_cursor: (!page.end_cursor().is_empty())
                        .then(|| page.end_cursor().to_string()),
                };
                let edges = page
                    .into_items()
                    .into_iter()
                    .map(|item| {
                        let node = <$node>::from(item);
                        $edge {
                            cursor: node.id.clone(),
                            node,
                        }
                    })
                    .collect();
                Self { edges, page_info }
            }
        }
    };
}

define_connection!(
    Article,
    conduit_models::article::Article,
    ArticleEdge,
    ArticleConnection
);
define_connection!(
    Comment,
    conduit_models::comment::Comment,
    CommentEdge,
    CommentConnection
);

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_util::pagination::{Direction, PageRequest};

    fn model_article(id: i64) -> conduit_models::article::Article {
        conduit_models::article::Article {
            id: id.to_string(),
            slug: format!("article-{id}"),
            title: format!("Article {id}"),
            description: "d".to_string(),
            body: "b".to_string(),
            tag_list: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            favorited: false,
            favorites_count: 0,
            author: conduit_models::user::Profile {
                username: "someone".to_string(),
                bio: None,
                image: None,
                following: false,
            },
        }
    }

    #[test]
    fn connection_carries_page_flags_and_item_cursors() {
        let request = PageRequest::new(Some("1".into()), 2, Some(Direction::Next));
        let page = Page::paginate(
            &request,
            vec![model_article(2), model_article(3), model_article(4)],
            |a| a.id.clone(),
        );

        let connection = ArticleConnection::from(page);
        assert_eq!(connection.edges.len(), 2);
        assert_eq!(connection.edges[0].cursor, "2");
        assert_eq!(connection.edges[1].node.slug, "article-3");
        assert!(connection.page_info.has_next_page);
        assert!(connection.page_info.has_previous_page);
        assert_eq!(connection.page_info.start_cursor.as_deref(), Some("2"));
        assert_eq!(connection.page_info.end_cursor.as_deref(), Some("3"));
    }

    #[test]
    fn empty_connection_has_null_cursors() {
        let request = PageRequest::new(None, 10, Some(Direction::Next));
        let page = Page::paginate(&request, Vec::new(), |a: &conduit_models::article::Article| {
            a.id.clone()
        });

        let connection = ArticleConnection::from(page);
        assert!(connection.edges.is_empty());
        assert!(!connection.page_info.has_next_page);
        assert!(!connection.page_info.has_previous_page);
        assert_eq!(connection.page_info.start_cursor, None);
        assert_eq!(connection.page_info.end_cursor, None);
    }
}
