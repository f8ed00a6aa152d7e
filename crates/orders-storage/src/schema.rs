//! Orders database schema.

/// SQL to create the orders table. The `users` table belongs to the users
/// service; both live in the shared platform database, which is why the
/// foreign key can be enforced here.
pub const CREATE_ORDERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS orders (
    id         UUID PRIMARY KEY,
    user_id    UUID NOT NULL REFERENCES users (id),
    items      JSONB NOT NULL,
    status     TEXT NOT NULL,
    total_sum  DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_orders_user_id
    ON orders (user_id, created_at);
";
