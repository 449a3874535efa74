#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_cookies::{cookie::CookieJar, Cookie};
use uuid::Uuid;
use yatube::{
    app,
    config::Config,
    db::{MemoryRepository, Repository},
    groups::models::Group,
    posts::models::Post,
    sessions::{models::Session, SESSION_COOKIE_NAME},
    users::models::{User, UserRole},
    AppState,
};

const BOUNDARY: &str = "yatube-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<MemoryRepository>,
    pub media: TempDir,
}

pub async fn setup() -> TestApp {
    let media = tempfile::tempdir().unwrap();

    let config = Config {
        media_root: media.path().to_path_buf(),
        cookies_secret: Some("s".repeat(64)),
        ..Default::default()
    };

    let repo = Arc::new(MemoryRepository::new());
    let state = AppState::new(&config, repo.clone());

    TestApp {
        router: app(state.clone()),
        state,
        repo,
        media,
    }
}

impl TestApp {
    pub async fn user(&self, username: &str) -> User {
        self.user_with_role(username, UserRole::User).await
    }

    pub async fn user_with_role(&self, username: &str, role: UserRole) -> User {
        self.repo
            .create_user(User {
                id: Uuid::now_v7(),
                username: username.to_string(),
                password: String::from("unusable"),
                role,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.repo
            .create_group(Group {
                id: Uuid::now_v7(),
                title: title.to_string(),
                slug: slug.to_string(),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.repo
            .create_post(Post {
                id: Uuid::now_v7(),
                text: text.to_string(),
                created_at: Utc::now(),
                author_id: author.id,
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .unwrap()
    }

    /// `Cookie` header value of a fresh session for `user`.
    pub async fn login(&self, user: &User) -> String {
        let session = self.session(user, Duration::hours(1)).await;

        self.session_cookie(&session)
    }

    /// Stores a session for `user` that expires `ttl` from now. A negative `ttl` is already expired.
    pub async fn session(&self, user: &User, ttl: Duration) -> Session {
        self.repo
            .create_session(Session::new(user.id, ttl))
            .await
            .unwrap()
    }

    pub fn session_cookie(&self, session: &Session) -> String {
        let mut jar = CookieJar::new();
        jar.private_mut(&self.state.inner.cookies_key)
            .add(Cookie::new(SESSION_COOKIE_NAME, session.id.to_string()));

        let cookie = jar.get(SESSION_COOKIE_NAME).unwrap();

        format!("{}={}", cookie.name(), cookie.value())
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response {
        let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        parts: &[Part<'_>],
        cookie: Option<&str>,
    ) -> Response {
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::from(multipart_body(parts))).unwrap())
            .await
    }

    pub async fn post_count(&self) -> i64 {
        self.repo
            .count_posts(yatube::db::PostFilter::All)
            .await
            .unwrap()
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());

        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }

        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    body
}

pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

pub fn texts(page: &serde_json::Value) -> Vec<String> {
    page["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["text"].as_str().unwrap().to_string())
        .collect()
}
