/// Type identifier for runtime values.
///
/// Built-in types occupy the low range; user-registered types are assigned
/// ids starting at [`TypeId::USER_BASE`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(u16);

impl TypeId {
    // Well-known type IDs
    pub const NULL: TypeId = TypeId(0);
    pub const NUMBER: TypeId = TypeId(1);
    pub const STRING: TypeId = TypeId(2);
    pub const BOOL: TypeId = TypeId(3);
    pub const VEC2: TypeId = TypeId(4);
    pub const VEC3: TypeId = TypeId(5);
    pub const ENTITY: TypeId = TypeId(6);

    /// First id available for user-registered types.
    pub const USER_BASE: u16 = 32;

    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Check if this is a built-in type.
    pub fn is_builtin(self) -> bool {
        self.0 < Self::USER_BASE
    }

    /// Get the name of a well-known type, or None for user types.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::NULL => Some("Null"),
            Self::NUMBER => Some("Number"),
            Self::STRING => Some("String"),
            Self::BOOL => Some("Bool"),
            Self::VEC2 => Some("Vec2"),
            Self::VEC3 => Some("Vec3"),
            Self::ENTITY => Some("Entity"),
            _ => None,
        }
    }
}

/// Opaque identifier of a game entity.
///
/// Entities live in collaborator-owned storage; scripts only ever hold the
/// id, never a pointer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EntityId(u64);

impl EntityId {
    /// The id no live entity carries. Deferred entity references hold this
    /// until the post-spawn resolution pass runs.
    pub const INVALID: EntityId = EntityId(u64::MAX);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
