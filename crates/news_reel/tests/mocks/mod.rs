pub mod assembler;
pub mod capturer;
pub mod composer;
pub mod narrator;
