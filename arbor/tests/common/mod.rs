use arbor::{Args, Context, ElementCollection, Tree};

/// Three divs, links at several depths, inputs, and a container inside
/// `#two`.
pub fn query_fixture() -> Context {
    let mut ctx = Context::new();
    ctx.tag("div", Args::new().id("one")).unwrap();
    ctx.tag_with("div", Args::new().id("two"), |ctx| {
        ctx.tag("a", ("Link 1", [("href", "/"), ("class", "one two")]))?;
        ctx.tag(
            "input",
            Args::new()
                .attr("type", "checkbox")
                .attr("data-attribute", "some_value"),
        )?;
        ctx.tag("input", [("type", "file")])?;
        ctx.container(|ctx| {
            ctx.tag("span", Args::new().id("in_container"))?;
            ctx.tag(
                "a",
                (
                    "Link 2",
                    [
                        ("href", "/blah"),
                        ("class", "external two"),
                        ("target", "_blank"),
                    ],
                ),
            )?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    ctx.tag_with("div", Args::new().id("three"), |ctx| {
        ctx.tag("a", Args::text("Link 3").class("three"))?;
        ctx.tag_with("div", (), |ctx| {
            ctx.tag("a", Args::text("Link 4").class("four")).map(drop)
        })?;
        Ok(())
    })
    .unwrap();
    ctx
}

pub fn describe_all(tree: &Tree, nodes: &ElementCollection) -> Vec<String> {
    nodes.iter().map(|&node| tree.describe(node)).collect()
}
