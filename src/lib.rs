mod bigint;
mod error;
mod forge;
mod hash;
mod message;
mod middle;
mod prefix;
mod sha1;
mod suffix;
mod template;

pub use error::{ForgeError, Infeasible, Severity};
pub use forge::{forge, forge_with_template};
pub use hash::Hasher;
pub use message::{forge_first, forge_message, numbered_variants};
pub use middle::{reconcile_middle, LIFT_STEPS};
pub use prefix::{ceil_cbrt, cube_root_prefix, PrefixRoot, ROUNDING_ATTEMPTS};
pub use sha1::{Sha1, SHA1_LEN};
pub use suffix::{cube_root_mod_pow2, cube_root_suffix};
pub use template::{lookup, supported, DigestInfoTemplate, HashKind, RSA1024_SHA1, RSA2048_SHA1};
