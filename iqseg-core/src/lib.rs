//! Ядро iqseg
//!
//! Потоковая нарезка сырых 8-битных I/Q данных RTL-SDR на блоки фиксированной
//! длины с перекрытием ("историей"). Все стадии ленивые итераторы поверх
//! [`std::io::Read`]:
//!
//! ```text
//! Read → ChunkReader → BlockAssembler → IqCodec::decode → OverlappingBlockReader
//! ```
//!
//! # Быстрый старт
//!
//! ```
//! use iqseg_core::block_reader;
//!
//! let raw = vec![127u8; 4 * 2 * 8]; // 32 выборки
//! for block in block_reader(&raw[..], 8, 4)? {
//!     let block = block?;
//!     assert_eq!(block.data.len(), 8);
//! }
//! # Ok::<(), iqseg_core::IqsegError>(())
//! ```

pub mod assembler;
pub mod chunk;
pub mod convert;
pub mod reader;

pub use assembler::*;
pub use chunk::*;
pub use convert::*;
pub use iqseg_types::{IqsegError, IqsegResult, Sample, SampleBlock};
pub use reader::*;
