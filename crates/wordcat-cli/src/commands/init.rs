//! The `wordcat init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("wordcat.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("instruments")?;
    write_if_missing(Path::new("instruments/sample.toml"), SAMPLE_INSTRUMENT)?;

    std::fs::create_dir_all("norms")?;
    write_if_missing(Path::new("norms/sample.json"), SAMPLE_NORMS)?;

    println!("\nNext steps:");
    println!("  1. Run: wordcat validate --instrument instruments/sample.toml --norms norms/sample.json");
    println!("  2. Run: wordcat start --state session.json --age 24 --sex female");
    println!("  3. Run: wordcat answer --state session.json --word <word> --yes");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# wordcat configuration

# Distinct words to ask about before scoring.
quota = 8
start_theta = -5.0

instrument = "instruments/sample.toml"
norms = "norms/sample.json"
state_dir = "./wordcat-sessions"

[estimator]
lower_bound = -6.0
upper_bound = 6.0
initial_step = 0.5
precision = 1e-6
max_iterations = 10000
"#;

const SAMPLE_INSTRUMENT: &str = r#"[instrument]
id = "sample-ws"
name = "Sample Words and Sentences"
description = "A twelve-word demonstration checklist with 4PL parameters"

[[items]]
word = "mommy"
word_id = 1
a = 1.6
b = -4.6
c = 0.0
d = 1.0

[[items]]
word = "ball"
word_id = 2
a = 1.4
b = -3.9
c = 0.0
d = 1.0

[[items]]
word = "dog"
word_id = 3
a = 1.8
b = -3.2
c = 0.0
d = 0.98

[[items]]
word = "cup"
word_id = 4
a = 1.2
b = -2.6
c = 0.02
d = 1.0

[[items]]
word = "shoe"
word_id = 5
a = 1.5
b = -2.0
c = 0.0
d = 1.0

[[items]]
word = "banana"
word_id = 6
a = 1.3
b = -1.3
c = 0.0
d = 0.97

[[items]]
word = "truck"
word_id = 7
a = 1.1
b = -0.7
c = 0.03
d = 1.0

[[items]]
word = "blanket"
word_id = 8
a = 1.7
b = 0.0
c = 0.0
d = 1.0

[[items]]
word = "scissors"
word_id = 9
a = 1.4
b = 0.6
c = 0.0
d = 0.96

[[items]]
word = "giraffe"
word_id = 10
a = 1.2
b = 1.2
c = 0.02
d = 1.0

[[items]]
word = "yesterday"
word_id = 11
a = 1.9
b = 1.9
c = 0.0
d = 1.0

[[items]]
word = "because"
word_id = 12
a = 1.6
b = 2.5
c = 0.0
d = 0.95
"#;

const SAMPLE_NORMS: &str = r#"{
  "female": {
    "words": [
      { "word_id": 1, "ages": { "24": { "p_mean": 5.3, "p_sd": 2.5, "np_mean": 0.3, "np_sd": 2.0 }, "30": { "p_mean": 6.8, "p_sd": 2.5, "np_mean": 1.05, "np_sd": 2.0 } } },
      { "word_id": 2, "ages": { "24": { "p_mean": 5.8, "p_sd": 2.5, "np_mean": 0.8, "np_sd": 2.0 }, "30": { "p_mean": 7.3, "p_sd": 2.5, "np_mean": 1.55, "np_sd": 2.0 } } },
      { "word_id": 3, "ages": { "24": { "p_mean": 6.3, "p_sd": 2.5, "np_mean": 1.3, "np_sd": 2.0 }, "30": { "p_mean": 7.8, "p_sd": 2.5, "np_mean": 2.05, "np_sd": 2.0 } } },
      { "word_id": 4, "ages": { "24": { "p_mean": 6.8, "p_sd": 2.5, "np_mean": 1.8, "np_sd": 2.0 }, "30": { "p_mean": 8.3, "p_sd": 2.5, "np_mean": 2.55, "np_sd": 2.0 } } },
      { "word_id": 5, "ages": { "24": { "p_mean": 7.3, "p_sd": 2.5, "np_mean": 2.3, "np_sd": 2.0 }, "30": { "p_mean": 8.8, "p_sd": 2.5, "np_mean": 3.05, "np_sd": 2.0 } } },
      { "word_id": 6, "ages": { "24": { "p_mean": 7.8, "p_sd": 2.5, "np_mean": 2.8, "np_sd": 2.0 }, "30": { "p_mean": 9.3, "p_sd": 2.5, "np_mean": 3.55, "np_sd": 2.0 } } },
      { "word_id": 7, "ages": { "24": { "p_mean": 8.3, "p_sd": 2.5, "np_mean": 3.3, "np_sd": 2.0 }, "30": { "p_mean": 9.8, "p_sd": 2.5, "np_mean": 4.05, "np_sd": 2.0 } } },
      { "word_id": 8, "ages": { "24": { "p_mean": 8.8, "p_sd": 2.5, "np_mean": 3.8, "np_sd": 2.0 }, "30": { "p_mean": 10.3, "p_sd": 2.5, "np_mean": 4.55, "np_sd": 2.0 } } },
      { "word_id": 9, "ages": { "24": { "p_mean": 9.3, "p_sd": 2.5, "np_mean": 4.3, "np_sd": 2.0 }, "30": { "p_mean": 10.8, "p_sd": 2.5, "np_mean": 5.05, "np_sd": 2.0 } } },
      { "word_id": 10, "ages": { "24": { "p_mean": 9.8, "p_sd": 2.5, "np_mean": 4.8, "np_sd": 2.0 }, "30": { "p_mean": 11.3, "p_sd": 2.5, "np_mean": 5.55, "np_sd": 2.0 } } },
      { "word_id": 11, "ages": { "24": { "p_mean": 10.3, "p_sd": 2.5, "np_mean": 5.3, "np_sd": 2.0 }, "30": { "p_mean": 11.8, "p_sd": 2.5, "np_mean": 6.05, "np_sd": 2.0 } } },
      { "word_id": 12, "ages": { "24": { "p_mean": 10.8, "p_sd": 2.5, "np_mean": 5.8, "np_sd": 2.0 }, "30": { "p_mean": 12.3, "p_sd": 2.5, "np_mean": 6.55, "np_sd": 2.0 } } }
    ],
    "bmin": { "24": 0.0, "30": 1.0 },
    "slope": { "24": 0.02, "30": 0.018 }
  },
  "male": {
    "words": [
      { "word_id": 1, "ages": { "24": { "p_mean": 5.0, "p_sd": 2.5, "np_mean": 0.0, "np_sd": 2.0 }, "30": { "p_mean": 6.5, "p_sd": 2.5, "np_mean": 0.75, "np_sd": 2.0 } } },
      { "word_id": 2, "ages": { "24": { "p_mean": 5.5, "p_sd": 2.5, "np_mean": 0.5, "np_sd": 2.0 }, "30": { "p_mean": 7.0, "p_sd": 2.5, "np_mean": 1.25, "np_sd": 2.0 } } },
      { "word_id": 3, "ages": { "24": { "p_mean": 6.0, "p_sd": 2.5, "np_mean": 1.0, "np_sd": 2.0 }, "30": { "p_mean": 7.5, "p_sd": 2.5, "np_mean": 1.75, "np_sd": 2.0 } } },
      { "word_id": 4, "ages": { "24": { "p_mean": 6.5, "p_sd": 2.5, "np_mean": 1.5, "np_sd": 2.0 }, "30": { "p_mean": 8.0, "p_sd": 2.5, "np_mean": 2.25, "np_sd": 2.0 } } },
      { "word_id": 5, "ages": { "24": { "p_mean": 7.0, "p_sd": 2.5, "np_mean": 2.0, "np_sd": 2.0 }, "30": { "p_mean": 8.5, "p_sd": 2.5, "np_mean": 2.75, "np_sd": 2.0 } } },
      { "word_id": 6, "ages": { "24": { "p_mean": 7.5, "p_sd": 2.5, "np_mean": 2.5, "np_sd": 2.0 }, "30": { "p_mean": 9.0, "p_sd": 2.5, "np_mean": 3.25, "np_sd": 2.0 } } },
      { "word_id": 7, "ages": { "24": { "p_mean": 8.0, "p_sd": 2.5, "np_mean": 3.0, "np_sd": 2.0 }, "30": { "p_mean": 9.5, "p_sd": 2.5, "np_mean": 3.75, "np_sd": 2.0 } } },
      { "word_id": 8, "ages": { "24": { "p_mean": 8.5, "p_sd": 2.5, "np_mean": 3.5, "np_sd": 2.0 }, "30": { "p_mean": 10.0, "p_sd": 2.5, "np_mean": 4.25, "np_sd": 2.0 } } },
      { "word_id": 9, "ages": { "24": { "p_mean": 9.0, "p_sd": 2.5, "np_mean": 4.0, "np_sd": 2.0 }, "30": { "p_mean": 10.5, "p_sd": 2.5, "np_mean": 4.75, "np_sd": 2.0 } } },
      { "word_id": 10, "ages": { "24": { "p_mean": 9.5, "p_sd": 2.5, "np_mean": 4.5, "np_sd": 2.0 }, "30": { "p_mean": 11.0, "p_sd": 2.5, "np_mean": 5.25, "np_sd": 2.0 } } },
      { "word_id": 11, "ages": { "24": { "p_mean": 10.0, "p_sd": 2.5, "np_mean": 5.0, "np_sd": 2.0 }, "30": { "p_mean": 11.5, "p_sd": 2.5, "np_mean": 5.75, "np_sd": 2.0 } } },
      { "word_id": 12, "ages": { "24": { "p_mean": 10.5, "p_sd": 2.5, "np_mean": 5.5, "np_sd": 2.0 }, "30": { "p_mean": 12.0, "p_sd": 2.5, "np_mean": 6.25, "np_sd": 2.0 } } }
    ],
    "bmin": { "24": 0.0, "30": 1.0 },
    "slope": { "24": 0.02, "30": 0.018 }
  }
}
"#;
