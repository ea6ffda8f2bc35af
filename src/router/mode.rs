/// Integer mode → router name table.
const MODE_TABLE: [(i64, &str); 6] = [
    (1, "http"),
    (2, "mq"),
    (3, "mcp"),
    (4, "grpc"),
    (5, "ws"),
    (6, "llm"),
];

/// Look up the router name registered for an integer mode.
///
/// Unregistered modes return `None`; callers must treat that as "no mapping"
/// rather than falling back to a default router.
#[must_use]
pub fn router_name_for_mode(mode: i64) -> Option<&'static str> {
    MODE_TABLE
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, name)| *name)
}
