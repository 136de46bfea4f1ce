//! Standard-library types reachable through `S` substitutions.
//!
//! `S<c>` names a well-known type without spelling its module and name. The
//! `Sc<c>` table covers the concurrency library, which lives in the standard
//! module namespace as well.

use crate::node::NodeKind;

/// Look up the nominal kind and name of a one-letter standard substitution.
pub(crate) fn standard_type(c: u8, concurrency: bool) -> Option<(NodeKind, &'static str)> {
    if concurrency {
        return concurrency_type(c);
    }
    let entry = match c {
        b'A' => (NodeKind::Structure, "AutoreleasingUnsafeMutablePointer"),
        b'a' => (NodeKind::Structure, "Array"),
        b'b' => (NodeKind::Structure, "Bool"),
        b'D' => (NodeKind::Structure, "Dictionary"),
        b'd' => (NodeKind::Structure, "Double"),
        b'f' => (NodeKind::Structure, "Float"),
        b'h' => (NodeKind::Structure, "Set"),
        b'I' => (NodeKind::Structure, "DefaultIndices"),
        b'i' => (NodeKind::Structure, "Int"),
        b'J' => (NodeKind::Structure, "Character"),
        b'N' => (NodeKind::Structure, "ClosedRange"),
        b'n' => (NodeKind::Structure, "Range"),
        b'O' => (NodeKind::Structure, "ObjectIdentifier"),
        b'P' => (NodeKind::Structure, "UnsafePointer"),
        b'p' => (NodeKind::Structure, "UnsafeMutablePointer"),
        b'R' => (NodeKind::Structure, "UnsafeBufferPointer"),
        b'r' => (NodeKind::Structure, "UnsafeMutableBufferPointer"),
        b'S' => (NodeKind::Structure, "String"),
        b's' => (NodeKind::Structure, "Substring"),
        b'u' => (NodeKind::Structure, "UInt"),
        b'V' => (NodeKind::Structure, "UnsafeRawPointer"),
        b'v' => (NodeKind::Structure, "UnsafeMutableRawPointer"),
        b'W' => (NodeKind::Structure, "UnsafeRawBufferPointer"),
        b'w' => (NodeKind::Structure, "UnsafeMutableRawBufferPointer"),

        b'q' => (NodeKind::Enum, "Optional"),

        b'B' => (NodeKind::Protocol, "BinaryFloatingPoint"),
        b'E' => (NodeKind::Protocol, "Encodable"),
        b'e' => (NodeKind::Protocol, "Decodable"),
        b'F' => (NodeKind::Protocol, "FloatingPoint"),
        b'G' => (NodeKind::Protocol, "RandomNumberGenerator"),
        b'H' => (NodeKind::Protocol, "Hashable"),
        b'j' => (NodeKind::Protocol, "Numeric"),
        b'K' => (NodeKind::Protocol, "BidirectionalCollection"),
        b'k' => (NodeKind::Protocol, "RandomAccessCollection"),
        b'L' => (NodeKind::Protocol, "Comparable"),
        b'l' => (NodeKind::Protocol, "Collection"),
        b'M' => (NodeKind::Protocol, "MutableCollection"),
        b'm' => (NodeKind::Protocol, "RangeReplaceableCollection"),
        b'Q' => (NodeKind::Protocol, "Equatable"),
        b'T' => (NodeKind::Protocol, "Sequence"),
        b't' => (NodeKind::Protocol, "IteratorProtocol"),
        b'U' => (NodeKind::Protocol, "UnsignedInteger"),
        b'X' => (NodeKind::Protocol, "RangeExpression"),
        b'x' => (NodeKind::Protocol, "Strideable"),
        b'Y' => (NodeKind::Protocol, "RawRepresentable"),
        b'y' => (NodeKind::Protocol, "StringProtocol"),
        b'Z' => (NodeKind::Protocol, "SignedInteger"),
        b'z' => (NodeKind::Protocol, "BinaryInteger"),
        _ => return None,
    };
    Some(entry)
}

fn concurrency_type(c: u8) -> Option<(NodeKind, &'static str)> {
    let entry = match c {
        b'A' => (NodeKind::Protocol, "Actor"),
        b'C' => (NodeKind::Structure, "CheckedContinuation"),
        b'c' => (NodeKind::Structure, "UnsafeContinuation"),
        b'E' => (NodeKind::Structure, "CancellationError"),
        b'e' => (NodeKind::Structure, "UnownedSerialExecutor"),
        b'F' => (NodeKind::Protocol, "Executor"),
        b'f' => (NodeKind::Protocol, "SerialExecutor"),
        b'G' => (NodeKind::Structure, "TaskGroup"),
        b'g' => (NodeKind::Structure, "ThrowingTaskGroup"),
        b'I' => (NodeKind::Protocol, "AsyncIteratorProtocol"),
        b'i' => (NodeKind::Protocol, "AsyncSequence"),
        b'J' => (NodeKind::Structure, "UnownedJob"),
        b'M' => (NodeKind::Class, "MainActor"),
        b'P' => (NodeKind::Structure, "TaskPriority"),
        b'S' => (NodeKind::Structure, "AsyncStream"),
        b's' => (NodeKind::Structure, "AsyncThrowingStream"),
        b'T' => (NodeKind::Structure, "Task"),
        b't' => (NodeKind::Structure, "UnsafeCurrentTask"),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_types() {
        assert_eq!(standard_type(b'i', false), Some((NodeKind::Structure, "Int")));
        assert_eq!(standard_type(b'q', false), Some((NodeKind::Enum, "Optional")));
        assert_eq!(standard_type(b'H', false), Some((NodeKind::Protocol, "Hashable")));
    }

    #[test]
    fn concurrency_table_is_separate() {
        assert_eq!(standard_type(b'T', false), Some((NodeKind::Protocol, "Sequence")));
        assert_eq!(standard_type(b'T', true), Some((NodeKind::Structure, "Task")));
        assert_eq!(standard_type(b'M', true), Some((NodeKind::Class, "MainActor")));
    }

    #[test]
    fn unknown_letters() {
        assert_eq!(standard_type(b'g', false), None);
        assert_eq!(standard_type(b'o', false), None);
        assert_eq!(standard_type(b'z', true), None);
    }
}
