//! Operation kinds: the fixed, ordered set of operations every unit counts.
//!
//! The order here is part of the snapshot format. Call sites index counters
//! by `OpKind as usize`, and the dumper iterates [`OpKind::ALL`] in the same
//! order, so adding a kind anywhere but the end reorders every snapshot.

macro_rules! op_kinds {
    ($($variant:ident => $name:literal,)+) => {
        /// A distinguishable operation a unit can perform.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(usize)]
        pub enum OpKind {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl OpKind {
            /// Every kind, in snapshot order.
            pub const ALL: &'static [OpKind] = &[$(OpKind::$variant,)+];

            /// Name used in snapshot keys.
            pub const fn name(self) -> &'static str {
                match self {
                    $(OpKind::$variant => $name,)+
                }
            }
        }
    };
}

op_kinds! {
    Null => "NULL",
    Stat => "STAT",
    Readlink => "READLINK",
    Mknod => "MKNOD",
    Mkdir => "MKDIR",
    Unlink => "UNLINK",
    Rmdir => "RMDIR",
    Symlink => "SYMLINK",
    Rename => "RENAME",
    Link => "LINK",
    Truncate => "TRUNCATE",
    Open => "OPEN",
    Read => "READ",
    Write => "WRITE",
    Statfs => "STATFS",
    Flush => "FLUSH",
    Fsync => "FSYNC",
    Setxattr => "SETXATTR",
    Getxattr => "GETXATTR",
    Removexattr => "REMOVEXATTR",
    Opendir => "OPENDIR",
    Fsyncdir => "FSYNCDIR",
    Access => "ACCESS",
    Create => "CREATE",
    Ftruncate => "FTRUNCATE",
    Fstat => "FSTAT",
    Lk => "LK",
    Lookup => "LOOKUP",
    Readdir => "READDIR",
    Inodelk => "INODELK",
    Finodelk => "FINODELK",
    Entrylk => "ENTRYLK",
    Fentrylk => "FENTRYLK",
    Xattrop => "XATTROP",
    Fxattrop => "FXATTROP",
    Fgetxattr => "FGETXATTR",
    Fsetxattr => "FSETXATTR",
    Rchecksum => "RCHECKSUM",
    Setattr => "SETATTR",
    Fsetattr => "FSETATTR",
    Readdirp => "READDIRP",
    Forget => "FORGET",
    Release => "RELEASE",
    Releasedir => "RELEASEDIR",
    Getspec => "GETSPEC",
    Fremovexattr => "FREMOVEXATTR",
    Fallocate => "FALLOCATE",
    Discard => "DISCARD",
    Zerofill => "ZEROFILL",
    Ipc => "IPC",
    Seek => "SEEK",
    Lease => "LEASE",
    Compound => "COMPOUND",
    Getactivelk => "GETACTIVELK",
    Setactivelk => "SETACTIVELK",
}

/// Number of operation kinds; the length of every unit's counter array.
pub const OP_COUNT: usize = OpKind::ALL.len();

impl OpKind {
    /// Index into a unit's counter array.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
