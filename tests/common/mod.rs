#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

/// Output directory: tests/output/<case>/
pub fn output_dir(case: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(case);
    fs::create_dir_all(&dir).expect("create output dir");
    dir
}

/// A typical one-page plan in the camelCase wire format.
pub fn sample_plan_json() -> String {
    serde_json::json!({
        "profile": { "age": 34, "gender": "Female", "region": "Maharashtra" },
        "calorieBreakdown": 1850,
        "macronutrientBreakdown": { "protein": 95, "carbs": 210, "fat": 62 },
        "dietPlan": {
            "breakfast": [
                { "name": "Vegetable Poha", "description": "With peanuts and curry leaves",
                  "calories": 320, "protein": 8, "carbs": 52, "fat": 9 }
            ],
            "lunch": [
                { "name": "Jowar Roti with Dal", "calories": 480, "protein": 22, "carbs": 70, "fat": 12 }
            ],
            "dinner": [],
            "snacks": [
                { "name": "Roasted Chana", "calories": 150, "protein": 9, "carbs": 20, "fat": 3.5 }
            ]
        },
        "importantNotes": "• Drink 3 litres of water\n- Avoid fried snacks\nWalk 30 minutes daily"
    })
    .to_string()
}

/// A plan with enough dinner entries to need several pages.
pub fn long_plan_json(entries: usize) -> String {
    let dinner: Vec<serde_json::Value> = (0..entries)
        .map(|i| {
            serde_json::json!({
                "name": format!("Dinner option {i}"),
                "description": "Seasonal vegetables, one katori dal and two phulkas",
                "calories": 400 + i,
                "protein": 20,
                "carbs": 55,
                "fat": 11
            })
        })
        .collect();
    serde_json::json!({
        "calorieBreakdown": 2000,
        "dietPlan": { "dinner": dinner },
        "importantNotes": ["Eat dinner before 8 pm"]
    })
    .to_string()
}

pub fn png_logo(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, _| {
        image::Rgba([0, 128, 64, if x % 2 == 0 { 255 } else { 0 }])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Page count from the page tree's `/Count`.
pub fn page_count(pdf: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(pdf);
    let start = text.find("/Count ")? + "/Count ".len();
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub fn count_occurrences(pdf: &[u8], needle: &str) -> usize {
    String::from_utf8_lossy(pdf).matches(needle).count()
}
