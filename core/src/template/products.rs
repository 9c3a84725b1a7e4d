//! Product prompt documents.
//!
//! Each constant is a complete instruction document. `{subject}` marks the
//! places where the person or country is inserted; nothing else in the text
//! is interpreted.

pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

pub const BIOGRAPHY: &str = r#"###Instruction###
Create a comprehensive biography of {subject} detailing the personal background, education, career progression, and other significant appointments or achievements. The biography should be structured as follows:

1. **NAME**: Full name of the individual.
2. **GOVERNMENT POSITION**: Current or most recent government position held.
3. **COUNTRY**: The official name of the country they serve or have served.
4. **BORN**: Date of birth.
5. **AGE**: Current age. Calculate the difference between the current date and the date of birth.
6. **MARITAL STATUS**: Information on marital status, including spouse and children if applicable. String format.
7. **EDUCATION**: Chronological list of educational achievements, including institutions attended and degrees or qualifications obtained. Give the breakdown in the form of PERIOD, INSTITUTION, DEGREE.
8. **CAREER**: Detailed account of the individual's career, including positions held, dates of service, and any promotions or notable responsibilities. This section can be continued as needed (e.g., "Career (cont'd)"). Do not miss the details of all promotions and double hatting positions. Give the breakdown in the form of YEAR and POSITION.
9. **OTHER APPOINTMENTS**: List of other significant appointments, roles, or contributions outside of their main career path.
10. **AWARDS and DECORATIONS**: List of awards and decorations received.
11. **LANGUAGES**: Languages spoken.
12. **REMARKS**: Any additional noteworthy information or personal achievements, including familial connections to other notable figures if relevant.

This format is designed to provide a clear and detailed overview of an individual's professional and personal life, highlighting their contributions and achievements in a structured manner.

###Information###
[INFO]

###Biography###"#;

pub const COUNTRY_DEVELOPMENTS: &str = r#"# CONTEXT #
You are an expert political and economic analyst.

# OBJECTIVE #
Write a comprehensive and detailed political report on the current political and economic situation of {subject}.

# STYLE #
Use a formal writing style, adhering to the linguistic norms and conventions of British English and spelling. Back arguments up with supporting facts, statistics, and quotes; avoid overgeneralizations and sweeping statements. Where possible, structure each paragraph in the following manner: a) thesis sentence; b) sentence elaborating thesis; c) supporting details (e.g., data, research, quotes); d) more supporting details (if applicable); e) concluding sentence.

# TONE #
The tone should be neutral and professional. Avoid normative statements, and passing value judgements.

# AUDIENCE #
The report is intended for Ministers and senior officials in the Ministry of Foreign Affairs.

# RESPONSE #
The report should be structured as follows:

1. **DEVELOPMENTS IN {subject}**

2. A succinct one-paragraph summary highlighting the most salient recent political, social or economic developments in {subject}.

3. **Political Developments**. Describe in detail the political standing of the government of the day. Mention any cabinet reshuffles, coups, infighting or intrigue in the last 6 months that may affect the government's stability or priorities. Describe the government's policy priorities.

4. Two to Five subsections highlighting other key recent trends and developments in {subject} over the past year that have not already been covered under **Political Developments**. Each sub-section should be parked under a header that describes the topic discussed. There is no need to have a dedicated subsection on human rights issues/abuses.

5. **Economic Developments**. Describe in detail the latest GDP growth figure of {subject}, and compare it to the previous year. Cite reputable sources such as the World Bank, UN, IMF. Note key macroeconomic trends and projections. Note the main economic opportunities and challenges facing {subject}.

6. **International Relations**. Describe in detail the foreign policy orientation of {subject}. Summarise the foreign relations of {subject} with key international partners, with particular attention to ASEAN, its neighbouring countries, and Singapore."#;

pub const FACTSHEET: &str = r#"### Instruction ###
You are an amazing research intern. I would like you to help me generate a factsheet of {subject}. Use the format below.

### Response ###
FACTSHEET ON [NAME OF COUNTRY]
Total Area: [Total Area in square kilometres]
Population: [Population size]
Ethnic Group: [List of ethnic groups, and percentage composition]
Languages: [List of official and other languages]
Government:
Type: [Government Type]
National Capital: [Name of National Capital]
Administrative Division: [Nomenclature and Number of Administrative Divisions]
Independence: [Date of Independence]
Executive Branch:
[name of chief of state]
[name of head of governement]
[cabinet list]
[list of elections/appointments]
Legislative Branch:
[Description]
Elections: [Type of Elections]
Judicial Branch:
Highest courts: [Name of Highest Courts]
Judge Selections and Term of Office: [Description]
Main Political Parties and Leaders: [List of main political parties and leaders]
Economy:
Real GDP (PPP): [Real GDP Purchasing Power Parity in US dollars]
GDP - Real Growth Rate: [Real Growth Rate in %]
Real GDP per capita (PPP): [Real GDP per capital (Purchasing Power Parity) in US dollars]
Inflation Rate: [Inflation Rate in %]
Exports:
[List of main exports]
[List of main exports partners]
Imports:
[List of main imports]
[List of main imports partners]
External Debt: [External Debt in US dollars and as % of GDP]"#;

pub const TARIFF_RESPONSE: &str = r#"### Task ###
You are a top-tier research analyst. Your goal is to generate a list of up-to-date, high-quality headlines related to the response of {subject} to the US reciprocal tariffs announced by the Trump Administration since Liberation Day.
### Format ###
For each headline:
- Begin with a **bolded summary sentence** that captures the essence of the headline.
- Follow with a brief contextual paragraph (2–3 sentences) explaining the significance or background of the story.
- End with a direct link to a reputable source or article for further reading."#;
