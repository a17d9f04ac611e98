use super::types::PromptInfo;

/// Builds the fixed instruction sent to the reasoning service. Names the
/// seven output keys the extractor expects; focus lists render comma-joined
/// and an empty list renders as an empty string.
pub fn build_instruction(prompt: &PromptInfo) -> String {
    format!(
        r#"You are an experienced English language teacher specializing in IELTS speaking assessment.

A student has recorded a speaking response to the following prompt:
Prompt: "{question}"
Difficulty Level: {difficulty}
Grammar Focus Areas: {grammar}
Vocabulary Focus: {vocabulary}

Please analyze the student's response in the following categories and provide constructive feedback:

1. GRAMMAR_ANALYSIS: Evaluate their use of grammar structures (correct tenses, subject-verb agreement, complex sentences). Note any errors and improvements needed. Focus on the grammar areas mentioned above.

2. VOCABULARY_ANALYSIS: Assess their vocabulary range and appropriateness. Identify strong vocabulary use and suggest more advanced alternatives where applicable. Focus on the vocabulary areas mentioned above.

3. FLUENCY_ANALYSIS: Comment on their delivery, pacing, coherence, and natural flow of speech. Note any hesitations or filler words.

4. CONTENT_RELEVANCE_ANALYSIS: Evaluate how well they addressed the prompt, the relevance of their examples, and the depth of their response.

5. SENTENCE_STRUCTURE_ANALYSIS: Analyze their ability to construct complex sentences and vary sentence types.

Also provide:
- OVERALL_SCORE: Rate their performance from 1-10 (10 being excellent)
- DETAILED_FEEDBACK: A brief summary of their overall performance with the most important areas to focus on

Format your response as a JSON object with these exact keys: grammar_analysis, vocabulary_analysis, fluency_analysis, content_relevance_analysis, sentence_structure_analysis, overall_score (number), detailed_feedback."#,
        question = prompt.question,
        difficulty = prompt.difficulty_level,
        grammar = prompt.grammar_focus_areas.join(", "),
        vocabulary = prompt.vocabulary_focus.join(", "),
    )
}
