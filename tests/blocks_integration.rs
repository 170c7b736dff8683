mod common;

use common::{failure_json, fixture_path, path_arg, run_testsift, success_json, write_temp_source};

#[test]
fn blocks_lists_names_lines_and_leading_comments() {
    let fixture = fixture_path("narrated.test.js");
    let response = success_json(&run_testsift(&["blocks", path_arg(&fixture)]));

    let blocks = response["blocks"].as_array().expect("blocks should be an array");
    assert_eq!(blocks.len(), 3);

    assert_eq!(blocks[0]["callee"], "describe");
    assert_eq!(blocks[0]["start_line"], 4);
    assert_eq!(blocks[0]["end_line"], 22);
    assert_eq!(blocks[0]["leading_comment"], "");

    assert_eq!(blocks[1]["name"], "rejects empty input");
    assert_eq!((blocks[1]["start_line"].as_u64(), blocks[1]["end_line"].as_u64()), (Some(8), Some(10)));
    assert!(
        blocks[1]["leading_comment"]
            .as_str()
            .is_some_and(|comment| comment.starts_with("// Given:"))
    );

    assert_eq!(blocks[2]["leading_comment"].as_str().map(|c| c.lines().count()), Some(5));
    assert!(blocks[2].get("body").is_none());
}

#[test]
fn name_glob_filters_blocks_and_verbose_adds_body() {
    let fixture = fixture_path("narrated.test.js");
    let response = success_json(&run_testsift(&[
        "blocks",
        "--name",
        "strips *",
        "--verbose",
        path_arg(&fixture),
    ]));

    let blocks = response["blocks"].as_array().expect("blocks should be an array");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["name"], "strips the currency suffix");
    assert!(
        blocks[0]["body"]
            .as_str()
            .is_some_and(|body| body.starts_with("test('strips") && body.ends_with('}'))
    );
}

#[test]
fn invalid_name_glob_is_reported() {
    let fixture = fixture_path("narrated.test.js");
    let response = failure_json(&run_testsift(&["blocks", "--name", "[", path_arg(&fixture)]));

    assert_eq!(response["error"]["type"], "invalid_name_pattern");
}

#[test]
fn test_calls_hidden_in_strings_templates_and_regexes_are_not_blocks() {
    let source = write_temp_source(
        ".test.ts",
        "const doc = `it('fake', () => {})`;\nconst re = /test\\(/;\n/* describe('x', () => {}) */\nit(`real ${kind}`, () => {});\n",
    );
    let response = success_json(&run_testsift(&["blocks", path_arg(&source)]));

    let blocks = response["blocks"].as_array().expect("blocks should be an array");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["name"], "real ${kind}");
    assert_eq!(blocks[0]["start_line"], 4);
}
