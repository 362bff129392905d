//! GFM constructs handled by markdown-rs: footnotes, tables,
//! strikethrough and task lists.

use multimark_core::{MultimarkError, ParseOptions};
use serde_json::Value;

use super::{Extension, ExtensionRegistry};
use crate::engine::Engine;

/// Switches one markdown-rs construct on.
pub struct Construct {
    name: &'static str,
    enable: fn(&mut ParseOptions),
}

impl Extension for Construct {
    fn name(&self) -> &str {
        self.name
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        (self.enable)(engine.parse_options_mut());
        Ok(())
    }
}

/// The four construct extensions.
pub const CONSTRUCTS: [Construct; 4] = [
    Construct {
        name: "footnote",
        enable: |parse| parse.footnotes = true,
    },
    Construct {
        name: "table",
        enable: |parse| parse.tables = true,
    },
    Construct {
        name: "strikethrough",
        enable: |parse| parse.strikethrough = true,
    },
    Construct {
        name: "tasklist",
        enable: |parse| parse.task_lists = true,
    },
];

pub(super) fn install(registry: &mut ExtensionRegistry) {
    for construct in CONSTRUCTS {
        registry.register(Box::new(construct));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderOptions;

    fn render(source: &str, names: &[&str]) -> String {
        let mut engine = Engine::new(RenderOptions {
            typographer: false,
            ..RenderOptions::default()
        });
        for construct in CONSTRUCTS.iter().filter(|c| names.contains(&c.name)) {
            construct.register(&mut engine, &Value::Null).unwrap();
        }
        engine.render(source).unwrap().html
    }

    #[test]
    fn tables_render_with_alignment() {
        let html = render("| a | b |\n|:-|-:|\n| 1 | 2 |\n", &["table"]);
        insta::assert_snapshot!(html, @r#"
        <table>
        <thead>
        <tr>
        <th style="text-align:left">a</th>
        <th style="text-align:right">b</th>
        </tr>
        </thead>
        <tbody>
        <tr>
        <td style="text-align:left">1</td>
        <td style="text-align:right">2</td>
        </tr>
        </tbody>
        </table>
        "#);
    }

    #[test]
    fn strikethrough_uses_s() {
        assert_eq!(render("~~gone~~\n", &["strikethrough"]), "<p><s>gone</s></p>\n");
        assert_eq!(render("~~kept~~\n", &[]), "<p>~~kept~~</p>\n");
    }

    #[test]
    fn task_items_get_checkboxes() {
        let html = render("- [x] done\n- [ ] todo\n", &["tasklist"]);
        insta::assert_snapshot!(html, @r#"
        <ul class="task-list">
        <li class="task-list-item"><input type="checkbox" id="cbx_0" disabled="true" checked="true"><label for="cbx_0">done</label></li>
        <li class="task-list-item"><input type="checkbox" id="cbx_1" disabled="true"><label for="cbx_1">todo</label></li>
        </ul>
        "#);
    }

    #[test]
    fn footnotes_are_listed_in_reference_order() {
        let html = render(
            "A[^b] B[^a] again[^b].\n\n[^a]: First.\n[^b]: Second.\n",
            &["footnote"],
        );
        insta::assert_snapshot!(html, @r##"
        <p>A<sup class="footnote-ref"><a href="#fn1" id="fnref1">[1]</a></sup> B<sup class="footnote-ref"><a href="#fn2" id="fnref2">[2]</a></sup> again<sup class="footnote-ref"><a href="#fn1" id="fnref1:1">[1]</a></sup>.</p>
        <hr class="footnotes-sep">
        <section class="footnotes">
        <ol class="footnotes-list">
        <li id="fn1" class="footnote-item"><p>Second. <a href="#fnref1" class="footnote-backref">↩︎</a> <a href="#fnref1:1" class="footnote-backref">↩︎</a></p>
        </li>
        <li id="fn2" class="footnote-item"><p>First. <a href="#fnref2" class="footnote-backref">↩︎</a></p>
        </li>
        </ol>
        </section>
        "##);
    }
}
