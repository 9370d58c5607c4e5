//! The four instruction templates sent alongside every image.
//!
//! Each template frames the model as a course assistant for students with
//! vision difficulties and asks for two sections: a one-sentence alt text and
//! a long description worked out in numbered steps. The answer is never
//! checked against that format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Generic,
    ComplexDiagram,
    DataVisualization,
    Other,
}

impl Category {
    /// Display order of the selector; the first entry is the default.
    pub const ALL: [Category; 4] = [
        Category::Generic,
        Category::ComplexDiagram,
        Category::DataVisualization,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Generic => "Generic Images",
            Category::ComplexDiagram => "Complex Diagrams",
            Category::DataVisualization => "Data Visualizations",
            Category::Other => "Other",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            Category::Generic => "Stock Images, Photography, Simple Graphics",
            Category::ComplexDiagram => {
                "Scientific Illustrations, Process Workflows, Detailed Graphics"
            }
            Category::DataVisualization => "Statistical Charts, Complex Data Visualizations",
            Category::Other => "Anything else...",
        }
    }

    /// Exact match against the display labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn template(self) -> PromptTemplate {
        let text = match self {
            Category::Generic => GENERIC_PROMPT,
            Category::ComplexDiagram => COMPLEX_DIAGRAM_PROMPT,
            Category::DataVisualization => DATA_VISUALIZATION_PROMPT,
            Category::Other => OTHER_PROMPT,
        };
        PromptTemplate {
            category: self,
            text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    category: Category,
    text: &'static str,
}

impl PromptTemplate {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn text(&self) -> &'static str {
        self.text
    }
}

/// What the UI needs to draw one option of the category selector.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub label: &'static str,
    pub caption: &'static str,
}

pub fn catalog() -> Vec<CategoryInfo> {
    Category::ALL
        .into_iter()
        .map(|c| CategoryInfo {
            id: c,
            label: c.label(),
            caption: c.caption(),
        })
        .collect()
}

const GENERIC_PROMPT: &str = r#"
Your role is to explain images in an online course for students with vision difficulties.
Frame your answers using natural language and easy-to-understand words.
Describe all important details of the image that would be important for a student to understand.

You have two tasks:

First: Provide a one-sentence alternative text description of the image.

Second: Provide a long description of the image describing the following features in detail.
Think through each step by step:
1. What is the image showing?
2. What are the key features of this image that a student should understand?
3. What is the primary takeaway and purpose of including this image in the course?

Follow this format in returning your response:

-Alt Text: {response}
-Long Description: {response}
"#;

const COMPLEX_DIAGRAM_PROMPT: &str = r#"
Your role is to explain complex diagrams in an online course for students with vision difficulties.
Frame your answers using natural language and easy-to-understand words.
Describe all important details of the diagram that would be important for a student to understand.

You have two tasks:

First: Provide a one-sentence alternative text description of the diagram.

Second: Provide a long description of the diagram describing the following features in detail.
Think through each step by step:
1. What kind of diagram is this (process workflow, scientific illustration, system layout, etc.) and what does it show?
2. What are the main components or labeled parts?
3. How are the components connected, and in what order or direction does the process flow?
4. What is the primary takeaway and purpose of including this diagram in the course?

Follow this format in returning your response:

-Alt Text: {response}
-Long Description: {response}
"#;

const DATA_VISUALIZATION_PROMPT: &str = r#"
Your role is to analyze data visualizations in an online course for students with vision difficulties.
Frame your answers using natural language and easy-to-understand words.
Describe all important details of the visualization that would be important for a student to understand.

You have two tasks:

First: Provide a one-sentence alternative text description of the visualization.

Second: Provide a long description of the data visualization describing the following features in detail.
Think through each step by step:
1. Understand the type of visualization used (stacked area chart, line graph, bar chart, etc.)
2. Determine the key metrics and axis dimensions included in the visualization
3. Determine the overall trend or message communicated in the visualization
4. Provide any key takeaway message

Follow this format in returning your response:

-Alt Text: {response}
-Long Description: {response}
"#;

const OTHER_PROMPT: &str = r#"
Your role is to analyze images in an online course for students with vision difficulties.
Frame your answers using natural language and easy-to-understand words.
Describe all important details of the image that would be important for a student to understand.

You have two tasks:

First: Provide a one-sentence alternative text description of the image.

Second: Provide a long description of the image describing its features in detail.
Think through each step by step:
1. What is this image showing?
2. What are any details you can extract? (e.g., words, locations, people)
3. What is the purpose of including this image in the course?
4. Provide any key takeaway message or emotion the image is intended to convey to sighted learners.

Follow this format in returning your response:

-Alt Text: {response}

-Long Description: {response}
"#;
