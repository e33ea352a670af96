pub mod elf;
pub mod facts;
pub mod introspect;
pub mod macho;
pub mod parse;
pub mod pe;
pub mod read;
