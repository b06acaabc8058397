//! Ambient binder flags, value-kind requirements and binder cache usage tags.

use std::fmt;

bitflags::bitflags! {
    /// Context bits inherited down the binder chain.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BinderFlags: u32 {
        const NONE                    = 0;
        /// Inside a low-level method, or everything when low-level code is allowed.
        const UNSAFE_REGION           = 1 << 0;
        const IGNORE_ACCESSIBILITY    = 1 << 1;
        const IN_CATCH_BLOCK          = 1 << 2;
        const IN_FINALLY_BLOCK        = 1 << 3;
        const IN_TRY_BLOCK            = 1 << 4;
        const IN_NESTED_FINALLY_BLOCK = 1 << 5;
        const FIELD_INITIALIZER       = 1 << 6;
        const PARAMETER_DEFAULT_VALUE = 1 << 7;

        /// Bits that never cross into a new executable code region.
        const ALL_CLEARED_AT_EXECUTABLE_CODE_BOUNDARY = Self::IN_CATCH_BLOCK.bits()
            | Self::IN_FINALLY_BLOCK.bits()
            | Self::IN_TRY_BLOCK.bits()
            | Self::IN_NESTED_FINALLY_BLOCK.bits();
    }
}

impl BinderFlags {
    /// Flags of a frame that starts a new executable code region.
    pub fn enter_executable_code(parent: BinderFlags, additional: BinderFlags) -> BinderFlags {
        (parent | additional) - BinderFlags::ALL_CLEARED_AT_EXECUTABLE_CODE_BOUNDARY
    }
}

bitflags::bitflags! {
    /// What an expression position requires of the expression bound there.
    ///
    /// The two low bits are reserved for telling apart variants of the same
    /// family; `family()` masks them off.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindValueKind: u32 {
        const INSIGNIFICANT          = 0b11;
        const RVALUE                 = 1 << 2;
        /// A readable value, or a method group that a call will consume.
        const RVALUE_OR_METHOD_GROUP = Self::RVALUE.bits() | 1;
        const ASSIGNABLE             = 2 << 2;
        const REFERS_TO_LOCATION     = 4 << 2;
        const REF_ASSIGNABLE         = 8 << 2;
        const READONLY_REF           = Self::REFERS_TO_LOCATION.bits() | Self::RVALUE.bits();
        const REF_OR_OUT             = Self::REFERS_TO_LOCATION.bits() | Self::RVALUE.bits() | Self::ASSIGNABLE.bits();
        const COMPOUND_ASSIGNMENT    = Self::RVALUE.bits() | Self::ASSIGNABLE.bits();
        const INCREMENT_DECREMENT    = Self::COMPOUND_ASSIGNMENT.bits() | 1;
        const REF_RETURN             = Self::READONLY_REF.bits() | 1;
    }
}

impl BindValueKind {
    /// The kind with the variant bits masked off.
    pub fn family(self) -> BindValueKind {
        self - BindValueKind::INSIGNIFICANT
    }

    pub fn requires_value(self) -> bool {
        self.family().contains(BindValueKind::RVALUE)
    }

    pub fn requires_assignable(self) -> bool {
        self.family().contains(BindValueKind::ASSIGNABLE)
    }

    pub fn requires_location(self) -> bool {
        self.family().contains(BindValueKind::REFERS_TO_LOCATION)
    }

    /// Whether a method group satisfies this requirement.
    pub fn allows_method_group(self) -> bool {
        self == BindValueKind::RVALUE_OR_METHOD_GROUP || !self.requires_value()
    }
}

/// The construct category a `NodeUsage` tag belongs to. Tags are only
/// comparable within one category; different categories reuse bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeUsageCategory {
    Method,
    Parameter,
    Field,
    NamedType,
    CompilationUnit,
}

/// Which binder is wanted for a node that owns several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeUsage(u8);

impl NodeUsage {
    pub const NORMAL: NodeUsage = NodeUsage(0);

    pub const METHOD_SIGNATURE: NodeUsage = NodeUsage(1 << 0);
    pub const METHOD_BODY: NodeUsage = NodeUsage(1 << 1);

    pub const PARAMETER_DEFAULT_VALUE: NodeUsage = NodeUsage(1 << 1);

    pub const FIELD_INITIALIZER: NodeUsage = NodeUsage(1 << 1);

    pub const NAMED_TYPE_BODY_OR_TEMPLATE_PARAMETERS: NodeUsage = NodeUsage(1 << 1);
    pub const NAMED_TYPE_BASE: NodeUsage = NodeUsage(1 << 2);

    pub const COMPILATION_UNIT_SCRIPT: NodeUsage = NodeUsage(1 << 1);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Every named tag of `category`, with its name.
    pub fn constants_for(category: NodeUsageCategory) -> &'static [(&'static str, NodeUsage)] {
        match category {
            NodeUsageCategory::Method => &[
                ("METHOD_SIGNATURE", NodeUsage::METHOD_SIGNATURE),
                ("METHOD_BODY", NodeUsage::METHOD_BODY),
            ],
            NodeUsageCategory::Parameter => &[("PARAMETER_DEFAULT_VALUE", NodeUsage::PARAMETER_DEFAULT_VALUE)],
            NodeUsageCategory::Field => &[("FIELD_INITIALIZER", NodeUsage::FIELD_INITIALIZER)],
            NodeUsageCategory::NamedType => &[
                ("NAMED_TYPE_BODY_OR_TEMPLATE_PARAMETERS", NodeUsage::NAMED_TYPE_BODY_OR_TEMPLATE_PARAMETERS),
                ("NAMED_TYPE_BASE", NodeUsage::NAMED_TYPE_BASE),
            ],
            NodeUsageCategory::CompilationUnit => &[("COMPILATION_UNIT_SCRIPT", NodeUsage::COMPILATION_UNIT_SCRIPT)],
        }
    }

    pub const CATEGORIES: [NodeUsageCategory; 5] = [
        NodeUsageCategory::Method,
        NodeUsageCategory::Parameter,
        NodeUsageCategory::Field,
        NodeUsageCategory::NamedType,
        NodeUsageCategory::CompilationUnit,
    ];
}

impl fmt::Display for NodeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_code_boundary_clears_exactly_four_bits() {
        let boundary = BinderFlags::ALL_CLEARED_AT_EXECUTABLE_CODE_BOUNDARY;
        assert_eq!(boundary.bits().count_ones(), 4);

        for bits in 0..=BinderFlags::all().bits() {
            let parent = BinderFlags::from_bits_truncate(bits);
            let entered = BinderFlags::enter_executable_code(parent, BinderFlags::NONE);
            assert!(!entered.intersects(boundary), "boundary bits leaked from {:?}", parent);
            assert_eq!(entered, parent - boundary, "non-boundary bits changed for {:?}", parent);
        }
    }

    #[test]
    fn test_additional_flags_survive_boundary() {
        let parent = BinderFlags::IN_TRY_BLOCK | BinderFlags::IGNORE_ACCESSIBILITY;
        let entered = BinderFlags::enter_executable_code(parent, BinderFlags::FIELD_INITIALIZER);
        assert_eq!(entered, BinderFlags::IGNORE_ACCESSIBILITY | BinderFlags::FIELD_INITIALIZER);
    }

    #[test]
    fn test_value_kind_families() {
        assert_eq!(BindValueKind::INCREMENT_DECREMENT.family(), BindValueKind::COMPOUND_ASSIGNMENT);
        assert_eq!(BindValueKind::RVALUE_OR_METHOD_GROUP.family(), BindValueKind::RVALUE);
        assert_eq!(BindValueKind::REF_RETURN.family(), BindValueKind::READONLY_REF);
        assert_ne!(BindValueKind::INCREMENT_DECREMENT, BindValueKind::COMPOUND_ASSIGNMENT);
        assert!(BindValueKind::INSIGNIFICANT.family().is_empty());
    }

    #[test]
    fn test_value_kind_requirements() {
        assert!(BindValueKind::RVALUE.requires_value());
        assert!(!BindValueKind::RVALUE.requires_assignable());
        assert!(BindValueKind::ASSIGNABLE.requires_assignable());
        assert!(BindValueKind::COMPOUND_ASSIGNMENT.requires_value());
        assert!(BindValueKind::COMPOUND_ASSIGNMENT.requires_assignable());
        assert!(BindValueKind::REF_OR_OUT.requires_location());
        assert!(BindValueKind::RVALUE_OR_METHOD_GROUP.allows_method_group());
        assert!(!BindValueKind::RVALUE.allows_method_group());
        assert!(BindValueKind::INSIGNIFICANT.allows_method_group());
    }

    #[test]
    fn test_node_usage_constants_do_not_collide_within_category() {
        for category in NodeUsage::CATEGORIES {
            let constants = NodeUsage::constants_for(category);
            for (i, (name_a, a)) in constants.iter().enumerate() {
                assert_ne!(a.bits(), 0, "{} must not be NORMAL", name_a);
                for (name_b, b) in &constants[i + 1..] {
                    assert_eq!(a.bits() & b.bits(), 0, "{} and {} share a bit in {:?}", name_a, name_b, category);
                }
            }
        }
    }

    #[test]
    fn test_node_usage_reuses_bits_across_categories() {
        assert_eq!(NodeUsage::METHOD_BODY, NodeUsage::FIELD_INITIALIZER);
        assert_eq!(NodeUsage::METHOD_BODY, NodeUsage::COMPILATION_UNIT_SCRIPT);
    }
}
