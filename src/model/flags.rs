//! Access flags of classes and members.
//!
//! Only the flags the shrinker consults are given names; unknown bits are preserved when
//! constructing from raw values via `from_bits_retain`.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Class access and property flags (JVMS §4.1)
    pub struct ClassAccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared final
        const FINAL = 0x0010;
        /// Treat superclass methods specially for invokespecial
        const SUPER = 0x0020;
        /// Is an interface
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
        /// Is a module descriptor
        const MODULE = 0x8000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Field and method access flags (JVMS §4.5, §4.6)
    pub struct MemberAccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Method declared synchronized
        const SYNCHRONIZED = 0x0020;
        /// Field declared volatile, or bridge method
        const VOLATILE_OR_BRIDGE = 0x0040;
        /// Field declared transient, or varargs method
        const TRANSIENT_OR_VARARGS = 0x0080;
        /// Method declared native
        const NATIVE = 0x0100;
        /// Method declared abstract
        const ABSTRACT = 0x0400;
        /// Method declared strictfp
        const STRICT = 0x0800;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Field is an element of an enum class
        const ENUM = 0x4000;
    }
}

impl MemberAccessFlags {
    /// Returns `true` if a method with these flags takes part in virtual dispatch.
    #[must_use]
    pub fn is_virtual(self) -> bool {
        !self.intersects(Self::PRIVATE | Self::STATIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_flags_virtual() {
        assert!(MemberAccessFlags::PUBLIC.is_virtual());
        assert!(MemberAccessFlags::empty().is_virtual());
        assert!(!(MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC).is_virtual());
        assert!(!MemberAccessFlags::PRIVATE.is_virtual());
    }

    #[test]
    fn test_class_flags_retain_unknown_bits() {
        let flags = ClassAccessFlags::from_bits_retain(0x0001 | 0x0100);
        assert!(flags.contains(ClassAccessFlags::PUBLIC));
        assert_eq!(flags.bits(), 0x0101);
    }
}
