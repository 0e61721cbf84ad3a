/*!
cpu::mod - Public facade for the 6502 CPU core.

```text
state.rs        - Registers, status flags and stack helpers.
addressing.rs   - Addressing mode enum and operand resolution.
execute.rs      - Instruction semantics, one handler per mnemonic.
table.rs        - Opcode metadata and the validated dispatch table.
trace.rs        - nestest-style disassembly for diagnostics.
core/           - `Cpu` facade: reset, load, step, run.
```

Feature `illegal_opcodes` registers the undocumented opcodes (default on).
*/

pub mod addressing;
pub mod core;
pub mod execute;
pub mod state;
pub mod table;
pub mod trace;

pub use crate::cpu::addressing::AddressingMode;
pub use crate::cpu::core::{Cpu, StepOutcome};
pub use crate::cpu::state::{CpuState, StatusFlags};
pub use crate::cpu::table::{Opcode, OpcodeTable, opcode_table};
pub use crate::cpu::trace::trace;
