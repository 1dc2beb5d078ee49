use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use shop_seed_core::{Collection, EntityKind, NewRow, Role};
use time::OffsetDateTime;
use ulid::Ulid;

const LATEST_SCHEMA_VERSION: i64 = 1;

const CREATE_SCHEMA_MIGRATIONS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at TEXT NOT NULL
);
";

const MIGRATION_001_SQL: &str = r"
CREATE TABLE IF NOT EXISTS security_questions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  question TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  username TEXT,
  email TEXT NOT NULL,
  password TEXT NOT NULL,
  role TEXT NOT NULL CHECK (role IN ('customer','deluxe','accounting','admin')),
  deluxe_token TEXT NOT NULL DEFAULT '',
  profile_image TEXT NOT NULL,
  totp_secret TEXT NOT NULL DEFAULT '',
  last_login_ip TEXT NOT NULL DEFAULT '',
  is_active INTEGER NOT NULL DEFAULT 1,
  created_at TEXT NOT NULL,
  deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS security_answers (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  security_question_id INTEGER NOT NULL,
  answer TEXT NOT NULL,
  FOREIGN KEY (user_id) REFERENCES users(id),
  FOREIGN KEY (security_question_id) REFERENCES security_questions(id)
);

CREATE TABLE IF NOT EXISTS addresses (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  full_name TEXT NOT NULL,
  mobile_num INTEGER NOT NULL,
  zip_code TEXT NOT NULL,
  street_address TEXT NOT NULL,
  city TEXT NOT NULL,
  state TEXT,
  country TEXT NOT NULL,
  FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS cards (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  full_name TEXT NOT NULL,
  card_num INTEGER NOT NULL,
  exp_month INTEGER NOT NULL CHECK (exp_month BETWEEN 1 AND 12),
  exp_year INTEGER NOT NULL,
  FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS wallets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  balance REAL NOT NULL DEFAULT 0,
  FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS challenges (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  key TEXT NOT NULL UNIQUE,
  name TEXT NOT NULL,
  category TEXT NOT NULL,
  tags TEXT,
  description TEXT NOT NULL,
  difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 6),
  solved INTEGER NOT NULL DEFAULT 0,
  mitigation_url TEXT,
  disabled_env TEXT,
  tutorial_order INTEGER,
  coding_challenge_status INTEGER NOT NULL DEFAULT 0,
  has_coding_challenge INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS hints (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  challenge_id INTEGER NOT NULL,
  text TEXT NOT NULL,
  sort_order INTEGER NOT NULL CHECK (sort_order >= 1),
  unlocked INTEGER NOT NULL DEFAULT 0,
  FOREIGN KEY (challenge_id) REFERENCES challenges(id)
);

CREATE TABLE IF NOT EXISTS products (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  description TEXT NOT NULL,
  price REAL NOT NULL,
  deluxe_price REAL NOT NULL,
  image TEXT NOT NULL,
  created_at TEXT NOT NULL,
  deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS quantities (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  product_id INTEGER NOT NULL,
  quantity INTEGER NOT NULL,
  limit_per_user INTEGER,
  FOREIGN KEY (product_id) REFERENCES products(id)
);

CREATE TABLE IF NOT EXISTS baskets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  coupon TEXT,
  FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS basket_items (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  basket_id INTEGER NOT NULL,
  product_id INTEGER NOT NULL,
  quantity INTEGER NOT NULL CHECK (quantity >= 1),
  UNIQUE(basket_id, product_id),
  FOREIGN KEY (basket_id) REFERENCES baskets(id),
  FOREIGN KEY (product_id) REFERENCES products(id)
);

CREATE TABLE IF NOT EXISTS feedbacks (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER,
  comment TEXT NOT NULL,
  rating INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 5),
  FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS complaints (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  message TEXT NOT NULL,
  file TEXT,
  FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS recycles (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  address_id INTEGER NOT NULL,
  quantity INTEGER NOT NULL,
  is_pickup INTEGER NOT NULL DEFAULT 0,
  date TEXT NOT NULL,
  FOREIGN KEY (user_id) REFERENCES users(id),
  FOREIGN KEY (address_id) REFERENCES addresses(id)
);

CREATE TABLE IF NOT EXISTS deliveries (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  price REAL NOT NULL,
  deluxe_price REAL NOT NULL,
  eta REAL NOT NULL,
  icon TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memories (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  image_path TEXT NOT NULL,
  caption TEXT NOT NULL,
  FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS documents (
  document_id TEXT PRIMARY KEY,
  collection TEXT NOT NULL CHECK (collection IN ('orders','reviews')),
  body_json TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
CREATE INDEX IF NOT EXISTS idx_hints_challenge ON hints(challenge_id);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
";

pub struct SqliteStore {
    conn: Connection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaStatus {
    pub current_version: i64,
    pub target_version: i64,
    pub pending_versions: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: i64,
    pub parent: String,
    pub fk_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrityReport {
    pub quick_check_ok: bool,
    pub quick_check_message: String,
    pub foreign_key_violations: Vec<ForeignKeyViolation>,
    pub schema_status: SchemaStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityCount {
    pub kind: EntityKind,
    pub live: u64,
    pub all: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeRecord {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub category: String,
    pub tags: Option<String>,
    pub description: String,
    pub difficulty: u8,
    pub solved: bool,
    pub mitigation_url: Option<String>,
    pub disabled_env: Option<String>,
    pub tutorial_order: Option<u32>,
    pub coding_challenge_status: u8,
    pub has_coding_challenge: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HintRecord {
    pub id: i64,
    pub challenge_id: i64,
    pub text: String,
    pub order: u32,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: Option<String>,
    pub email: String,
    pub role: Role,
    pub deluxe_token: String,
    pub profile_image: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub deluxe_price: f64,
    pub image: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredDocument {
    pub document_id: String,
    pub collection: Collection,
    pub body: serde_json::Value,
    pub created_at: String,
}

impl SqliteStore {
    /// Open a SQLite-backed seed store and configure required runtime pragmas.
    ///
    /// # Errors
    /// Returns an error when the database cannot be opened or pragmas cannot be applied.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to configure sqlite pragmas")?;

        Ok(Self { conn })
    }

    /// Report current and target schema versions plus pending migrations.
    ///
    /// # Errors
    /// Returns an error when schema metadata cannot be read or initialized.
    pub fn schema_status(&self) -> Result<SchemaStatus> {
        self.conn
            .execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)
            .context("failed to apply schema_migrations table")?;
        let current_version = current_schema_version(&self.conn)?;
        let pending_versions = if current_version < LATEST_SCHEMA_VERSION {
            ((current_version + 1)..=LATEST_SCHEMA_VERSION).collect::<Vec<_>>()
        } else {
            Vec::new()
        };

        Ok(SchemaStatus {
            current_version,
            target_version: LATEST_SCHEMA_VERSION,
            pending_versions,
        })
    }

    /// Apply all forward migrations up to the latest supported schema version.
    ///
    /// # Errors
    /// Returns an error when a migration step fails or the database is newer than supported.
    pub fn migrate(&mut self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)
            .context("failed to apply schema_migrations table")?;

        let mut version = current_schema_version(&self.conn)?;
        if version == 0 {
            let tx = self.conn.transaction().context("failed to begin migration 1")?;
            tx.execute_batch(MIGRATION_001_SQL).context("failed to apply migration 1")?;
            record_schema_version(&tx, 1)?;
            tx.commit().context("failed to commit migration 1")?;
            version = 1;
        }

        if version != LATEST_SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported schema version {version}; expected {LATEST_SCHEMA_VERSION}"
            ));
        }

        Ok(())
    }

    /// Insert one entity row and return its generated id.
    ///
    /// # Errors
    /// Returns an error when a constraint (foreign key, uniqueness, check) rejects the row.
    pub fn insert(&mut self, row: &NewRow) -> Result<i64> {
        let now = now_rfc3339()?;
        let conn = &self.conn;
        let changed = match row {
            NewRow::SecurityQuestion(row) => conn.execute(
                "INSERT INTO security_questions(question) VALUES (?1)",
                params![row.question],
            ),
            NewRow::User(row) => conn.execute(
                "INSERT INTO users(
                    username, email, password, role, deluxe_token, profile_image,
                    totp_secret, last_login_ip, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.username,
                    row.email,
                    row.password,
                    row.role.as_str(),
                    row.deluxe_token,
                    row.profile_image,
                    row.totp_secret,
                    row.last_login_ip,
                    now,
                ],
            ),
            NewRow::SecurityAnswer(row) => conn.execute(
                "INSERT INTO security_answers(user_id, security_question_id, answer) VALUES (?1, ?2, ?3)",
                params![row.user_id, row.security_question_id, row.answer],
            ),
            NewRow::Address(row) => conn.execute(
                "INSERT INTO addresses(
                    user_id, full_name, mobile_num, zip_code, street_address, city, state, country
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.user_id,
                    row.full_name,
                    row.mobile_num,
                    row.zip_code,
                    row.street_address,
                    row.city,
                    row.state,
                    row.country,
                ],
            ),
            NewRow::Card(row) => conn.execute(
                "INSERT INTO cards(user_id, full_name, card_num, exp_month, exp_year)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.user_id, row.full_name, row.card_num, row.exp_month, row.exp_year],
            ),
            NewRow::Wallet(row) => conn.execute(
                "INSERT INTO wallets(user_id, balance) VALUES (?1, ?2)",
                params![row.user_id, row.balance],
            ),
            NewRow::Challenge(row) => conn.execute(
                "INSERT INTO challenges(
                    key, name, category, tags, description, difficulty, solved, mitigation_url,
                    disabled_env, tutorial_order, coding_challenge_status, has_coding_challenge
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, 0, ?10)",
                params![
                    row.key,
                    row.name,
                    row.category,
                    row.tags,
                    row.description,
                    row.difficulty,
                    row.mitigation_url,
                    row.disabled_env,
                    row.tutorial_order,
                    row.has_coding_challenge,
                ],
            ),
            NewRow::Hint(row) => conn.execute(
                "INSERT INTO hints(challenge_id, text, sort_order, unlocked) VALUES (?1, ?2, ?3, ?4)",
                params![row.challenge_id, row.text, row.order, row.unlocked],
            ),
            NewRow::Product(row) => conn.execute(
                "INSERT INTO products(name, description, price, deluxe_price, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![row.name, row.description, row.price, row.deluxe_price, row.image, now],
            ),
            NewRow::Quantity(row) => conn.execute(
                "INSERT INTO quantities(product_id, quantity, limit_per_user) VALUES (?1, ?2, ?3)",
                params![row.product_id, row.quantity, row.limit_per_user],
            ),
            NewRow::Basket(row) => conn.execute(
                "INSERT INTO baskets(user_id) VALUES (?1)",
                params![row.user_id],
            ),
            NewRow::BasketItem(row) => conn.execute(
                "INSERT INTO basket_items(basket_id, product_id, quantity) VALUES (?1, ?2, ?3)",
                params![row.basket_id, row.product_id, row.quantity],
            ),
            NewRow::Feedback(row) => conn.execute(
                "INSERT INTO feedbacks(user_id, comment, rating) VALUES (?1, ?2, ?3)",
                params![row.user_id, row.comment, row.rating],
            ),
            NewRow::Complaint(row) => conn.execute(
                "INSERT INTO complaints(user_id, message) VALUES (?1, ?2)",
                params![row.user_id, row.message],
            ),
            NewRow::Recycle(row) => conn.execute(
                "INSERT INTO recycles(user_id, address_id, quantity, is_pickup, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.user_id, row.address_id, row.quantity, row.is_pickup, row.date],
            ),
            NewRow::DeliveryMethod(row) => conn.execute(
                "INSERT INTO deliveries(name, price, deluxe_price, eta, icon) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.name, row.price, row.deluxe_price, row.eta, row.icon],
            ),
            NewRow::Memory(row) => conn.execute(
                "INSERT INTO memories(user_id, image_path, caption) VALUES (?1, ?2, ?3)",
                params![row.user_id, row.image_path, row.caption],
            ),
        };

        changed.with_context(|| format!("failed to insert {} `{}`", row.kind(), row.natural_key()))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Remove a row: users and products are soft-deleted, every other kind is deleted.
    ///
    /// # Errors
    /// Returns an error when no live row with that id exists or the statement fails.
    pub fn destroy(&mut self, kind: EntityKind, id: i64) -> Result<()> {
        let table = table_name(kind);
        let changed = if kind.is_soft_deletable() {
            let now = now_rfc3339()?;
            self.conn.execute(
                &format!("UPDATE {table} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL"),
                params![now, id],
            )
        } else {
            self.conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
        }
        .with_context(|| format!("failed to destroy {kind} {id}"))?;

        if changed == 0 {
            return Err(anyhow!("no live {kind} with id {id}"));
        }
        Ok(())
    }

    /// Replace a challenge description.
    ///
    /// # Errors
    /// Returns an error when the challenge does not exist.
    pub fn update_challenge_description(&mut self, challenge_id: i64, description: &str) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE challenges SET description = ?1 WHERE id = ?2",
                params![description, challenge_id],
            )
            .with_context(|| format!("failed to update description of challenge {challenge_id}"))?;
        if changed == 0 {
            return Err(anyhow!("challenge {challenge_id} does not exist"));
        }
        Ok(())
    }

    /// Append a JSON document to a collection and return its document id.
    ///
    /// # Errors
    /// Returns an error when the document cannot be serialized or stored.
    pub fn insert_document(&mut self, collection: Collection, body: &serde_json::Value) -> Result<String> {
        let document_id = Ulid::new().to_string();
        let body_json = serde_json::to_string(body).context("failed to serialize document body")?;
        self.conn
            .execute(
                "INSERT INTO documents(document_id, collection, body_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![document_id, collection.as_str(), body_json, now_rfc3339()?],
            )
            .with_context(|| format!("failed to insert document into {collection}"))?;
        Ok(document_id)
    }

    /// Documents of one collection in insertion order.
    ///
    /// # Errors
    /// Returns an error when rows cannot be read or contain invalid JSON.
    pub fn documents(&self, collection: Collection) -> Result<Vec<StoredDocument>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT document_id, body_json, created_at FROM documents
                 WHERE collection = ?1 ORDER BY rowid",
            )
            .context("failed to prepare document query")?;
        let rows = stmt.query_map(params![collection.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (document_id, body_json, created_at) = row?;
            let body = serde_json::from_str(&body_json)
                .with_context(|| format!("invalid JSON in document {document_id}"))?;
            documents.push(StoredDocument { document_id, collection, body, created_at });
        }
        Ok(documents)
    }

    /// Rows of a kind excluding soft-deleted ones.
    ///
    /// # Errors
    /// Returns an error when the count query fails.
    pub fn count_live(&self, kind: EntityKind) -> Result<u64> {
        let table = table_name(kind);
        let sql = if kind.is_soft_deletable() {
            format!("SELECT COUNT(*) FROM {table} WHERE deleted_at IS NULL")
        } else {
            format!("SELECT COUNT(*) FROM {table}")
        };
        count(&self.conn, &sql)
    }

    /// Rows of a kind including soft-deleted ones.
    ///
    /// # Errors
    /// Returns an error when the count query fails.
    pub fn count_all(&self, kind: EntityKind) -> Result<u64> {
        count(&self.conn, &format!("SELECT COUNT(*) FROM {}", table_name(kind)))
    }

    /// Live and total row counts for every entity kind.
    ///
    /// # Errors
    /// Returns an error when any count query fails.
    pub fn counts(&self) -> Result<Vec<EntityCount>> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| {
                Ok(EntityCount { kind, live: self.count_live(kind)?, all: self.count_all(kind)? })
            })
            .collect()
    }

    /// # Errors
    /// Returns an error when the count query fails.
    pub fn document_count(&self, collection: Collection) -> Result<u64> {
        let total = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("failed to count {collection} documents"))?;
        u64::try_from(total).context("negative document count")
    }

    /// All challenges ordered by id.
    ///
    /// # Errors
    /// Returns an error when rows cannot be read.
    pub fn list_challenges(&self) -> Result<Vec<ChallengeRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, key, name, category, tags, description, difficulty, solved,
                        mitigation_url, disabled_env, tutorial_order, coding_challenge_status,
                        has_coding_challenge
                 FROM challenges ORDER BY id",
            )
            .context("failed to prepare challenge query")?;
        let rows = stmt.query_map([], |row| {
            Ok(ChallengeRecord {
                id: row.get(0)?,
                key: row.get(1)?,
                name: row.get(2)?,
                category: row.get(3)?,
                tags: row.get(4)?,
                description: row.get(5)?,
                difficulty: row.get(6)?,
                solved: row.get(7)?,
                mitigation_url: row.get(8)?,
                disabled_env: row.get(9)?,
                tutorial_order: row.get(10)?,
                coding_challenge_status: row.get(11)?,
                has_coding_challenge: row.get(12)?,
            })
        })?;

        let mut challenges = Vec::new();
        for row in rows {
            challenges.push(row?);
        }
        Ok(challenges)
    }

    /// # Errors
    /// Returns an error when the query fails.
    pub fn challenge_by_key(&self, key: &str) -> Result<Option<ChallengeRecord>> {
        Ok(self.list_challenges()?.into_iter().find(|challenge| challenge.key == key))
    }

    /// Hints of one challenge in display order.
    ///
    /// # Errors
    /// Returns an error when rows cannot be read.
    pub fn list_hints(&self, challenge_id: i64) -> Result<Vec<HintRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, challenge_id, text, sort_order, unlocked FROM hints
                 WHERE challenge_id = ?1 ORDER BY sort_order",
            )
            .context("failed to prepare hint query")?;
        let rows = stmt.query_map(params![challenge_id], |row| {
            Ok(HintRecord {
                id: row.get(0)?,
                challenge_id: row.get(1)?,
                text: row.get(2)?,
                order: row.get(3)?,
                unlocked: row.get(4)?,
            })
        })?;

        let mut hints = Vec::new();
        for row in rows {
            hints.push(row?);
        }
        Ok(hints)
    }

    /// First user with this email, soft-deleted users included.
    ///
    /// # Errors
    /// Returns an error when the query fails or the stored role is unknown.
    pub fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, email, role, deluxe_token, profile_image, deleted_at
                 FROM users WHERE email = ?1 ORDER BY id LIMIT 1",
                params![email],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<String>>(6)?,
                    ))
                },
            )
            .optional()
            .with_context(|| format!("failed to look up user {email}"))?;

        let Some((id, username, email, role, deluxe_token, profile_image, deleted_at)) = row else {
            return Ok(None);
        };
        let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown role `{role}` for user {id}"))?;
        Ok(Some(UserRecord {
            id,
            username,
            email,
            role,
            deluxe_token,
            profile_image,
            deleted: deleted_at.is_some(),
        }))
    }

    /// # Errors
    /// Returns an error when the query fails.
    pub fn product(&self, id: i64) -> Result<Option<ProductRecord>> {
        self.conn
            .query_row(
                "SELECT id, name, description, price, deluxe_price, image, deleted_at
                 FROM products WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ProductRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        price: row.get(3)?,
                        deluxe_price: row.get(4)?,
                        image: row.get(5)?,
                        deleted: row.get::<_, Option<String>>(6)?.is_some(),
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to look up product {id}"))
    }

    /// Run quick-check, foreign-key-check, and schema status health probes.
    ///
    /// # Errors
    /// Returns an error when any integrity probe query fails.
    pub fn integrity_check(&self) -> Result<IntegrityReport> {
        let quick_check_message: String = self
            .conn
            .query_row("PRAGMA quick_check", [], |row| row.get::<_, String>(0))
            .context("failed to run PRAGMA quick_check")?;

        let mut stmt = self
            .conn
            .prepare("PRAGMA foreign_key_check")
            .context("failed to prepare PRAGMA foreign_key_check")?;
        let rows = stmt.query_map([], |row| {
            Ok(ForeignKeyViolation {
                table: row.get(0)?,
                rowid: row.get(1)?,
                parent: row.get(2)?,
                fk_index: row.get(3)?,
            })
        })?;

        let mut foreign_key_violations = Vec::new();
        for row in rows {
            foreign_key_violations.push(row?);
        }

        let schema_status = self.schema_status()?;
        Ok(IntegrityReport {
            quick_check_ok: quick_check_message == "ok",
            quick_check_message,
            foreign_key_violations,
            schema_status,
        })
    }
}

fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::SecurityQuestion => "security_questions",
        EntityKind::User => "users",
        EntityKind::SecurityAnswer => "security_answers",
        EntityKind::Address => "addresses",
        EntityKind::Card => "cards",
        EntityKind::Wallet => "wallets",
        EntityKind::Challenge => "challenges",
        EntityKind::Hint => "hints",
        EntityKind::Product => "products",
        EntityKind::Quantity => "quantities",
        EntityKind::Basket => "baskets",
        EntityKind::BasketItem => "basket_items",
        EntityKind::Feedback => "feedbacks",
        EntityKind::Complaint => "complaints",
        EntityKind::Recycle => "recycles",
        EntityKind::DeliveryMethod => "deliveries",
        EntityKind::Memory => "memories",
    }
}

fn count(conn: &Connection, sql: &str) -> Result<u64> {
    let total = conn
        .query_row(sql, [], |row| row.get::<_, i64>(0))
        .with_context(|| format!("failed to run count query: {sql}"))?;
    u64::try_from(total).context("negative row count")
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    let version = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
            row.get::<_, i64>(0)
        })
        .context("failed to read current schema version")?;
    Ok(version)
}

fn record_schema_version(conn: &Connection, version: i64) -> Result<()> {
    let now = now_rfc3339()?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
        params![version, now],
    )
    .with_context(|| format!("failed to record migration version {version}"))?;
    Ok(())
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .context("failed to format RFC3339 timestamp")
}
