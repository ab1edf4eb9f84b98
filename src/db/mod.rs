mod schema;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;

/// SQLite-backed store for every entity the site serves.
///
/// Cloning is cheap; clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

const PROPOSAL_COLUMNS: &str = "id, space_id, title, description, tags, latitude, longitude, closed, author, support_votes, pub_date";
const POST_COLUMNS: &str =
    "id, space_id, title, message, author, pub_index, pub_date, last_update";
const SPACE_COLUMNS: &str = "id, name, url, description, date";
const USER_COLUMNS: &str = "id, username, email, is_superuser, is_active, date_joined";

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        schema::run_migrations(&conn)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let conn = self.conn()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (username, email, is_superuser, is_active, date_joined)
             VALUES (?, ?, ?, 1, ?)",
            (
                &input.username,
                &input.email,
                input.is_superuser,
                format_datetime(now),
            ),
        )
        .with_context(|| format!("Failed to create user {}", input.username))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: input.username,
            email: input.email,
            is_superuser: input.is_superuser,
            is_active: true,
            date_joined: parse_datetime(format_datetime(now)),
            permissions: BTreeSet::new(),
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
                [username],
                user_from_row,
            )
            .optional()?;

        match user {
            Some(mut user) => {
                user.permissions = fetch_permissions(&conn, user.id)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Resolve an API token to its owner.
    pub fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT u.id, u.username, u.email, u.is_superuser, u.is_active, u.date_joined
                 FROM auth_tokens t JOIN users u ON u.id = t.user_id
                 WHERE t.token = ?",
                [token],
                user_from_row,
            )
            .optional()?;

        match user {
            Some(mut user) => {
                user.permissions = fetch_permissions(&conn, user.id)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    pub fn set_user_active(&self, user_id: i64, active: bool) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET is_active = ? WHERE id = ?",
            (active, user_id),
        )?;
        Ok(rows > 0)
    }

    pub fn grant_permission(&self, user_id: i64, permission: Permission) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_permissions (user_id, permission) VALUES (?, ?)",
            (user_id, permission.as_str()),
        )?;
        Ok(())
    }

    pub fn revoke_permission(&self, user_id: i64, permission: Permission) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM user_permissions WHERE user_id = ? AND permission = ?",
            (user_id, permission.as_str()),
        )?;
        Ok(rows > 0)
    }

    /// Issue a new API token for a user.
    pub fn create_token(&self, user_id: i64) -> Result<String> {
        let conn = self.conn()?;
        let token = Uuid::new_v4().simple().to_string();
        conn.execute(
            "INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)",
            (&token, user_id, format_datetime(Utc::now())),
        )?;
        Ok(token)
    }

    // ============================================================
    // Space operations
    // ============================================================

    pub fn create_space(&self, input: CreateSpaceInput) -> Result<Space> {
        let conn = self.conn()?;
        let date = input.date.unwrap_or_else(Utc::now);

        conn.execute(
            "INSERT INTO spaces (name, url, description, date) VALUES (?, ?, ?, ?)",
            (&input.name, &input.url, &input.description, format_datetime(date)),
        )
        .with_context(|| format!("Failed to create space {}", input.url))?;

        Ok(Space {
            id: conn.last_insert_rowid(),
            name: input.name,
            url: input.url,
            description: input.description,
            date: parse_datetime(format_datetime(date)),
        })
    }

    pub fn get_space_by_url(&self, url: &str) -> Result<Option<Space>> {
        let conn = self.conn()?;
        let space = conn
            .query_row(
                &format!("SELECT {SPACE_COLUMNS} FROM spaces WHERE url = ?"),
                [url],
                space_from_row,
            )
            .optional()?;
        Ok(space)
    }

    pub fn get_all_spaces(&self) -> Result<Vec<Space>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SPACE_COLUMNS} FROM spaces ORDER BY name, id"
        ))?;
        let spaces = stmt
            .query_map([], space_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(spaces)
    }

    /// The `limit` most recently created spaces, newest first.
    pub fn get_recent_spaces(&self, limit: u32) -> Result<Vec<Space>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SPACE_COLUMNS} FROM spaces ORDER BY date DESC, id DESC LIMIT ?"
        ))?;
        let spaces = stmt
            .query_map([limit], space_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(spaces)
    }

    // ============================================================
    // Proposal operations
    // ============================================================

    pub fn create_proposal(&self, input: CreateProposalInput) -> Result<Proposal> {
        let conn = self.conn()?;
        let now = Utc::now();
        let form = input.form;
        let (latitude, longitude) = form.coordinates();

        conn.execute(
            "INSERT INTO proposals (space_id, title, description, tags, latitude, longitude, closed, author, support_votes, pub_date)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, 0, ?)",
            (
                input.space_id,
                &form.title,
                &form.description,
                &form.tags,
                latitude,
                longitude,
                &input.author,
                format_datetime(now),
            ),
        )?;

        Ok(Proposal {
            id: conn.last_insert_rowid(),
            space_id: input.space_id,
            title: form.title,
            description: form.description,
            tags: form.tags,
            latitude,
            longitude,
            closed: false,
            author: input.author,
            support_votes: 0,
            pub_date: parse_datetime(format_datetime(now)),
        })
    }

    /// Look up a proposal, but only within the given space.
    pub fn get_proposal(&self, space_id: i64, id: i64) -> Result<Option<Proposal>> {
        let conn = self.conn()?;
        let proposal = conn
            .query_row(
                &format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ? AND space_id = ?"),
                (id, space_id),
                proposal_from_row,
            )
            .optional()?;
        Ok(proposal)
    }

    pub fn count_proposals(&self, space_id: i64) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM proposals WHERE space_id = ?",
            [space_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Proposals of a space in submission order.
    pub fn get_proposals(&self, space_id: i64, limit: Option<u32>, offset: u64) -> Result<Vec<Proposal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE space_id = ?
             ORDER BY pub_date, id LIMIT ? OFFSET ?"
        ))?;
        let proposals = stmt
            .query_map((space_id, sql_limit(limit), offset as i64), proposal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(proposals)
    }

    /// Overwrite the user-editable fields of a proposal. Server-owned fields
    /// (space, author, votes) are left untouched.
    pub fn update_proposal(&self, space_id: i64, id: i64, form: &ProposalForm) -> Result<Option<Proposal>> {
        let (latitude, longitude) = form.coordinates();
        let rows = {
            let conn = self.conn()?;
            conn.execute(
                "UPDATE proposals SET title = ?, description = ?, tags = ?, latitude = ?, longitude = ?
                 WHERE id = ? AND space_id = ?",
                (
                    &form.title,
                    &form.description,
                    &form.tags,
                    latitude,
                    longitude,
                    id,
                    space_id,
                ),
            )?
        };

        if rows == 0 {
            return Ok(None);
        }
        self.get_proposal(space_id, id)
    }

    pub fn delete_proposal(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM proposals WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Post operations
    // ============================================================

    pub fn create_post(&self, input: CreatePostInput) -> Result<Post> {
        let conn = self.conn()?;
        let pub_date = format_datetime(input.pub_date);

        conn.execute(
            "INSERT INTO posts (space_id, title, message, author, pub_index, pub_date, last_update)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                input.space_id,
                &input.title,
                &input.message,
                &input.author,
                input.pub_index,
                &pub_date,
                &pub_date,
            ),
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            space_id: input.space_id,
            title: input.title,
            message: input.message,
            author: input.author,
            pub_index: input.pub_index,
            pub_date: parse_datetime(pub_date.clone()),
            last_update: parse_datetime(pub_date),
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let conn = self.conn()?;
        let post = conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"),
                [id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    pub fn update_post(&self, id: i64, input: UpdatePostInput) -> Result<Option<Post>> {
        let rows = {
            let conn = self.conn()?;
            conn.execute(
                "UPDATE posts SET title = ?, message = ?, pub_index = ?, last_update = ? WHERE id = ?",
                (
                    &input.title,
                    &input.message,
                    input.pub_index,
                    format_datetime(Utc::now()),
                    id,
                ),
            )?
        };

        if rows == 0 {
            return Ok(None);
        }
        self.get_post(id)
    }

    pub fn delete_post(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM posts WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    pub fn count_published_posts(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE pub_index = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Posts flagged for the index, newest first. Both the index page and the
    /// news list read through here so they always agree on the set.
    pub fn get_published_posts(&self, limit: Option<u32>, offset: u64) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE pub_index = 1
             ORDER BY pub_date DESC, id DESC LIMIT ? OFFSET ?"
        ))?;
        let posts = stmt
            .query_map((sql_limit(limit), offset as i64), post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// The most recent posts regardless of the index flag.
    pub fn get_recent_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY pub_date DESC, id DESC LIMIT ?"
        ))?;
        let posts = stmt
            .query_map([limit], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    pub fn get_space_posts(&self, space_id: i64) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE space_id = ? ORDER BY pub_date DESC, id DESC"
        ))?;
        let posts = stmt
            .query_map([space_id], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    // ============================================================
    // Static page operations
    // ============================================================

    pub fn create_static_page(&self, input: CreateStaticPageInput) -> Result<StaticPage> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO static_pages (name, uri, content, show_footer, sort_order) VALUES (?, ?, ?, ?, ?)",
            (
                &input.name,
                &input.uri,
                &input.content,
                input.show_footer,
                input.order,
            ),
        )
        .with_context(|| format!("Failed to create page {}", input.uri))?;

        Ok(StaticPage {
            id: conn.last_insert_rowid(),
            name: input.name,
            uri: input.uri,
            content: input.content,
            show_footer: input.show_footer,
            order: input.order,
        })
    }

    /// Pages linked from the footer, highest `order` first.
    pub fn get_footer_pages(&self) -> Result<Vec<StaticPage>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, uri, content, show_footer, sort_order
             FROM static_pages WHERE show_footer = 1 ORDER BY sort_order DESC, id",
        )?;
        let pages = stmt
            .query_map([], |row| {
                Ok(StaticPage {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    uri: row.get(2)?,
                    content: row.get(3)?,
                    show_footer: row.get(4)?,
                    order: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "cidadania", "ecidadania")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("ecidadania.db"))
}

fn fetch_permissions(conn: &Connection, user_id: i64) -> Result<BTreeSet<Permission>> {
    let mut stmt = conn.prepare("SELECT permission FROM user_permissions WHERE user_id = ?")?;
    let codenames = stmt
        .query_map([user_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(codenames
        .iter()
        .filter_map(|c| {
            let permission = Permission::from_str(c);
            if permission.is_none() {
                tracing::warn!("Ignoring unknown permission {} for user {}", c, user_id);
            }
            permission
        })
        .collect())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        is_superuser: row.get(3)?,
        is_active: row.get(4)?,
        date_joined: parse_datetime(row.get(5)?),
        permissions: BTreeSet::new(),
    })
}

fn space_from_row(row: &Row<'_>) -> rusqlite::Result<Space> {
    Ok(Space {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        description: row.get(3)?,
        date: parse_datetime(row.get(4)?),
    })
}

fn proposal_from_row(row: &Row<'_>) -> rusqlite::Result<Proposal> {
    Ok(Proposal {
        id: row.get(0)?,
        space_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tags: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        closed: row.get(7)?,
        author: row.get(8)?,
        support_votes: row.get(9)?,
        pub_date: parse_datetime(row.get(10)?),
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        space_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        author: row.get(4)?,
        pub_index: row.get(5)?,
        pub_date: parse_datetime(row.get(6)?),
        last_update: parse_datetime(row.get(7)?),
    })
}

/// SQLite treats a negative LIMIT as "no limit".
fn sql_limit(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(-1)
}

// Fixed-width microsecond timestamps so that string order equals time order.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
