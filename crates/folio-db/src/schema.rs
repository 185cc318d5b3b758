//! SQL schema definitions.

/// Complete schema for Folio v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Books & access
-- ============================================================

CREATE TABLE IF NOT EXISTS books (
    book_id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_name TEXT NOT NULL,
    identify TEXT NOT NULL UNIQUE,
    description TEXT,
    privately_owned INTEGER NOT NULL DEFAULT 0,
    order_index INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_order ON books(order_index DESC, book_id DESC);

-- Direct member -> book roles. role_id 0 is the founder.
CREATE TABLE IF NOT EXISTS book_roles (
    book_id INTEGER NOT NULL,
    member_id INTEGER NOT NULL,
    role_id INTEGER NOT NULL,
    PRIMARY KEY (book_id, member_id)
);

CREATE INDEX IF NOT EXISTS idx_book_roles_member ON book_roles(member_id);

CREATE TABLE IF NOT EXISTS team_members (
    team_id INTEGER NOT NULL,
    member_id INTEGER NOT NULL,
    role_id INTEGER NOT NULL,
    PRIMARY KEY (team_id, member_id)
);

CREATE TABLE IF NOT EXISTS team_books (
    team_id INTEGER NOT NULL,
    book_id INTEGER NOT NULL,
    PRIMARY KEY (team_id, book_id)
);

-- ============================================================
-- Reading history
-- ============================================================

CREATE TABLE IF NOT EXISTS book_read_history (
    history_id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL,
    book_id INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    last_read_at INTEGER NOT NULL,
    read_count INTEGER NOT NULL DEFAULT 1,
    UNIQUE (member_id, book_id)
);

CREATE INDEX IF NOT EXISTS idx_history_member_recent ON book_read_history(member_id, last_read_at DESC);

-- ============================================================
-- Workspaces (itemsets)
-- ============================================================

CREATE TABLE IF NOT EXISTS workspaces (
    workspace_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS book_workspaces (
    relationship_id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL,
    workspace_id INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (book_id, workspace_id)
);

CREATE INDEX IF NOT EXISTS idx_book_workspaces_workspace ON book_workspaces(workspace_id);

-- ============================================================
-- Labels
-- ============================================================

CREATE TABLE IF NOT EXISTS labels (
    label_id INTEGER PRIMARY KEY AUTOINCREMENT,
    label_name TEXT NOT NULL UNIQUE,
    book_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS book_labels (
    book_label_id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL,
    label_id INTEGER NOT NULL REFERENCES labels(label_id),
    UNIQUE (book_id, label_id)
);

CREATE INDEX IF NOT EXISTS idx_book_labels_label ON book_labels(label_id);
"#;
