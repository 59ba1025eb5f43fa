pub mod disclose;
pub mod init;
pub mod issue;
pub mod keygen;
pub mod list;
pub mod present;
pub mod revoke;
pub mod verify;
