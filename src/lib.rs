// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svganim` turns an [`anitree`] document into a flat scene of paintable objects
and a score of linear animations.

```no_run
let text = std::fs::read_to_string("in.svg").unwrap();
let mut doc = anitree::Document::parse_str(&text, &anitree::Options::default()).unwrap();
let (mut scene, score) = svganim::build_scene(&mut doc, &anitree::LocalFetcher);
score.apply(&mut doc, 500.0);
scene.sync(&mut doc);
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod animation;
mod builder;
mod load;
mod scene;
mod script;
mod shapes;

pub use animation::{Interval, Repeat, Score, ScoreEntry, Timeline};
pub use builder::{build_scene, SceneBuilder};
pub use load::{register_load_handlers, LoadTraverser};
pub use scene::{ImageData, ObjectId, ObjectKind, Paint, Scene, SceneObject, TextData};
pub use script::{expose_document, run_scripts};

pub use anitree;
pub use tiny_skia;
